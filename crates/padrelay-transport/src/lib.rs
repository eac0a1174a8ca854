//! Byte-stream transports for padrelay.
//!
//! Two kinds of endpoint live here:
//! - TCP streams and listeners carrying framed state records from producers
//! - Serial devices receiving formatted packets on the consumer side
//!
//! This is the lowest layer of padrelay. Everything else builds on top of
//! [`RelayStream`] and [`SerialPort`].

pub mod error;
pub mod serial;
pub mod tcp;

pub use error::{Result, TransportError};
pub use serial::{SerialConfig, SerialPort, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};
pub use tcp::{RelayStream, TcpTransport};
