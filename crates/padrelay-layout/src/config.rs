use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LayoutError, Result};
use crate::schema;

/// Maximum bytes read from a layout config file.
pub const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;

/// Declarative description of a device packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Exact length of every produced packet.
    pub output_size: usize,
    /// Seed the first and last byte with the legacy sentinel patterns.
    ///
    /// Unset means "only for 6-byte layouts", which is how configs written
    /// before the flag existed behave.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_sentinels: Option<bool>,
    /// One mapping per output position, in order.
    #[serde(default)]
    pub bytes: Vec<ByteMapping>,
}

/// How a single output byte is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ByteMapping {
    /// A fixed value.
    Const {
        #[serde(default)]
        value: u8,
    },
    /// The raw value of one record field.
    Field { field: String },
    /// A bitmask of non-zero fields.
    Bits {
        #[serde(default)]
        bits: Vec<BitMapping>,
    },
}

/// One bit of a `bits` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitMapping {
    /// Bit position, 0 (LSB) to 7.
    pub pos: u8,
    /// Record field that sets the bit when non-zero.
    pub field: String,
}

impl ByteMapping {
    pub fn constant(value: u8) -> Self {
        ByteMapping::Const { value }
    }

    pub fn field(name: impl Into<String>) -> Self {
        ByteMapping::Field { field: name.into() }
    }

    pub fn bits<'a>(entries: impl IntoIterator<Item = (u8, &'a str)>) -> Self {
        ByteMapping::Bits {
            bits: entries
                .into_iter()
                .map(|(pos, field)| BitMapping {
                    pos,
                    field: field.to_string(),
                })
                .collect(),
        }
    }
}

impl LayoutConfig {
    /// The built-in 6-byte packet: a button header, four axis bytes and a
    /// button trailer.
    pub fn legacy() -> Self {
        Self {
            output_size: 6,
            legacy_sentinels: None,
            bytes: vec![
                ByteMapping::bits([(0, "W"), (1, "E"), (2, "S")]),
                ByteMapping::field("LjoyX"),
                ByteMapping::field("LjoyY"),
                ByteMapping::field("RjoyY"),
                ByteMapping::field("RT"),
                ByteMapping::bits([(5, "LB"), (6, "RB"), (7, "N")]),
            ],
        }
    }

    /// Whether the legacy sentinel seeds apply to this layout.
    pub fn uses_legacy_sentinels(&self) -> bool {
        self.legacy_sentinels.unwrap_or(self.output_size == 6)
    }

    /// Parse and schema-check a config from a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        schema::validate(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Parse and schema-check a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse and schema-check a config from JSON bytes.
    pub fn from_json_slice(json: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(json)?;
        Self::from_value(value)
    }

    /// Load a config file, refusing files over [`MAX_CONFIG_FILE_SIZE`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let read_err = |source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(path).map_err(read_err)?;
        let size = file.metadata().map_err(read_err)?.len();
        if size > MAX_CONFIG_FILE_SIZE as u64 {
            return Err(LayoutError::TooLarge {
                path: path.to_path_buf(),
                size,
                max: MAX_CONFIG_FILE_SIZE,
            });
        }

        let read_limit = u64::try_from(MAX_CONFIG_FILE_SIZE.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = Vec::new();
        file.take(read_limit)
            .read_to_end(&mut content)
            .map_err(read_err)?;
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LayoutError::TooLarge {
                path: path.to_path_buf(),
                size: content.len() as u64,
                max: MAX_CONFIG_FILE_SIZE,
            });
        }

        Self::from_json_slice(&content)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::legacy()
    }
}
