//! Connection sessions and the relay server.
//!
//! A [`Session`] owns one producer connection: it reads verified frames,
//! decodes each payload into a [`StateRecord`](padrelay_layout::StateRecord),
//! packs it with the shared [`ByteLayout`](padrelay_layout::ByteLayout) and
//! hands the packet to a [`Sink`]. [`RelayServer`] accepts TCP connections and
//! runs one session per connection on its own thread.

pub mod decoder;
pub mod error;
pub mod server;
pub mod session;
pub mod sink;

pub use decoder::{JsonRecordDecoder, RecordDecoder};
pub use error::{Result, SessionError};
pub use server::RelayServer;
pub use session::{Session, SessionReport, SessionState, SessionStats, DEBUG_INTERVAL};
pub use sink::{NoDevice, SerialSinkFactory, Sink, SinkFactory};
