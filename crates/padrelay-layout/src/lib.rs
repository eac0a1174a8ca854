//! Controller state records and the declarative byte-layout engine.
//!
//! A [`LayoutConfig`] describes, byte by byte, how a [`StateRecord`] is packed
//! into the fixed-length packet a downstream device expects. Configs are
//! validated against an embedded JSON Schema, then compiled into an immutable
//! [`ByteLayout`] that can be shared across threads and applied with
//! [`ByteLayout::format`].

pub mod config;
pub mod error;
pub mod layout;
pub mod record;
pub mod schema;

pub use config::{BitMapping, ByteMapping, LayoutConfig, MAX_CONFIG_FILE_SIZE};
pub use error::{LayoutError, Result};
pub use layout::{hex, ByteLayout, LEGACY_END_BYTE, LEGACY_START_BYTE, MAX_OUTPUT_SIZE};
pub use record::{Field, StateRecord};
