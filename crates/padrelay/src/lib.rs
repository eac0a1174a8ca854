//! Relay gamepad state records from a network producer to a serial device.
//!
//! Producers send JSON state records over TCP, each wrapped in a
//! length-prefixed frame with a CRC-32 trailer. The relay verifies every
//! frame, packs the record into the fixed-length packet the device expects
//! using a declarative byte layout, and writes it to the serial port.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP streams/listeners and the serial device port
//! - [`frame`]: length-prefixed, checksum-suffixed framing
//! - [`layout`]: state records and the byte-layout engine
//! - [`session`]: per-connection sessions, sinks and the relay server

/// Re-export transport types.
pub mod transport {
    pub use padrelay_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use padrelay_frame::*;
}

/// Re-export layout types.
pub mod layout {
    pub use padrelay_layout::*;
}

/// Re-export session and server types.
pub mod session {
    pub use padrelay_session::*;
}
