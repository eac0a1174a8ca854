use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use padrelay_layout::{hex, ByteLayout, StateRecord};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    output_size: usize,
    legacy_sentinels: bool,
    hex: String,
    bytes: &'a [u8],
    unknown_fields: &'a [String],
    record: &'a StateRecord,
}

pub fn print_packet(packet: &[u8], record: &StateRecord, layout: &ByteLayout, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                output_size: layout.output_size(),
                legacy_sentinels: layout.legacy_sentinels(),
                hex: hex(packet),
                bytes: packet,
                unknown_fields: layout.unknown_fields(),
                record,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["BYTE", "HEX", "BINARY", "DEC"]);
            for (index, byte) in packet.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    format!("{byte:02X}"),
                    format!("{byte:08b}"),
                    byte.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{record}");
            println!("packet[{}]: {}", packet.len(), hex(packet));
            if !layout.unknown_fields().is_empty() {
                println!("unknown fields: {}", layout.unknown_fields().join(", "));
            }
        }
        OutputFormat::Raw => print_raw(packet),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
