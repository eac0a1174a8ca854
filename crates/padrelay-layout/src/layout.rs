use std::path::Path;

use tracing::debug;

use crate::config::{ByteMapping, LayoutConfig};
use crate::error::{LayoutError, Result};
use crate::record::{Field, StateRecord};

/// Largest packet a layout may describe.
pub const MAX_OUTPUT_SIZE: usize = 65_536;

/// Legacy seed for the first packet byte.
pub const LEGACY_START_BYTE: u8 = 0b1010_1000;

/// Legacy seed for the last packet byte.
pub const LEGACY_END_BYTE: u8 = 0b0001_0101;

/// A mapping with field names already resolved. `None` reads as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    Const(u8),
    Field(Option<Field>),
    Bits {
        entries: Vec<(u8, Option<Field>)>,
        keep_seed: bool,
    },
}

/// A validated, compiled layout.
///
/// Immutable once built; share it with `Arc` and rebuild to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteLayout {
    seed: Vec<u8>,
    mappings: Vec<Resolved>,
    legacy_sentinels: bool,
    unknown_fields: Vec<String>,
}

impl ByteLayout {
    /// Validate and compile a config.
    ///
    /// Mappings past `output_size` are dropped and unknown field names compile
    /// to a constant zero; neither is an error.
    pub fn load(config: &LayoutConfig) -> Result<Self> {
        if config.output_size == 0 || config.output_size > MAX_OUTPUT_SIZE {
            return Err(LayoutError::InvalidOutputSize {
                size: config.output_size,
                max: MAX_OUTPUT_SIZE,
            });
        }

        for (index, mapping) in config.bytes.iter().enumerate() {
            if let ByteMapping::Bits { bits } = mapping {
                if let Some(bad) = bits.iter().find(|bit| bit.pos > 7) {
                    return Err(LayoutError::InvalidBitPosition {
                        index,
                        pos: bad.pos,
                    });
                }
            }
        }

        let layout = Self::compile(config);
        debug!(
            output_size = layout.output_size(),
            mappings = layout.mappings.len(),
            dropped = config.bytes.len() - layout.mappings.len(),
            legacy_sentinels = layout.legacy_sentinels,
            unknown_fields = ?layout.unknown_fields,
            "layout loaded"
        );
        Ok(layout)
    }

    /// Read, validate and compile a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::load(&LayoutConfig::from_path(path)?)
    }

    fn compile(config: &LayoutConfig) -> Self {
        let size = config.output_size;
        let legacy_sentinels = config.uses_legacy_sentinels();

        let mut seed = vec![0u8; size];
        if legacy_sentinels {
            seed[0] = LEGACY_START_BYTE;
            // A one-byte layout keeps only the trailer seed.
            seed[size - 1] = LEGACY_END_BYTE;
        }

        let mut unknown_fields = Vec::new();
        let mut resolve = |name: &str| {
            let field = Field::from_name(name);
            if field.is_none() && !unknown_fields.iter().any(|known| known == name) {
                unknown_fields.push(name.to_string());
            }
            field
        };

        let mappings = config
            .bytes
            .iter()
            .take(size)
            .enumerate()
            .map(|(index, mapping)| match mapping {
                ByteMapping::Const { value } => Resolved::Const(*value),
                ByteMapping::Field { field } => Resolved::Field(resolve(field)),
                ByteMapping::Bits { bits } => Resolved::Bits {
                    entries: bits
                        .iter()
                        .map(|bit| (1u8 << bit.pos, resolve(&bit.field)))
                        .collect(),
                    keep_seed: legacy_sentinels && (index == 0 || index == size - 1),
                },
            })
            .collect();

        Self {
            seed,
            mappings,
            legacy_sentinels,
            unknown_fields,
        }
    }

    /// Pack a record into a packet of exactly [`ByteLayout::output_size`] bytes.
    pub fn format(&self, record: &StateRecord) -> Vec<u8> {
        let mut out = self.seed.clone();
        self.apply(record, &mut out);
        out
    }

    /// Pack a record into the front of `out`, leaving any extra bytes alone.
    pub fn format_into(&self, record: &StateRecord, out: &mut [u8]) -> Result<usize> {
        let size = self.output_size();
        let Some(slots) = out.get_mut(..size) else {
            return Err(LayoutError::BufferTooSmall {
                needed: size,
                len: out.len(),
            });
        };
        slots.copy_from_slice(&self.seed);
        self.apply(record, slots);
        Ok(size)
    }

    fn apply(&self, record: &StateRecord, out: &mut [u8]) {
        let value = |field: &Option<Field>| field.map_or(0, |f| record.get(f));

        for (slot, mapping) in out.iter_mut().zip(&self.mappings) {
            *slot = match mapping {
                Resolved::Const(byte) => *byte,
                Resolved::Field(field) => value(field),
                Resolved::Bits { entries, keep_seed } => {
                    let base = if *keep_seed { *slot } else { 0 };
                    entries
                        .iter()
                        .filter(|(_, field)| value(field) != 0)
                        .fold(base, |acc, (mask, _)| acc | mask)
                }
            };
        }
    }

    /// Length of every packet this layout produces.
    pub fn output_size(&self) -> usize {
        self.seed.len()
    }

    /// Whether the legacy sentinel seeds are applied.
    pub fn legacy_sentinels(&self) -> bool {
        self.legacy_sentinels
    }

    /// Field names referenced by the config that match no record field.
    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown_fields
    }
}

impl Default for ByteLayout {
    /// The built-in legacy 6-byte layout.
    fn default() -> Self {
        Self::compile(&LayoutConfig::legacy())
    }
}

/// Space-separated uppercase hex, e.g. `A8 00 15`.
pub fn hex(packet: &[u8]) -> String {
    packet
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
