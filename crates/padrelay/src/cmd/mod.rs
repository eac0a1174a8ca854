use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use padrelay_frame::DEFAULT_MAX_PAYLOAD;
use padrelay_layout::ByteLayout;
use padrelay_transport::{DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};
use tracing::warn;

use crate::exit::{layout_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod format;
pub mod serve;
pub mod simulate;
pub mod version;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept producers and relay their records to the serial device.
    Serve(ServeArgs),
    /// Connect to a relay and send generated records.
    Simulate(SimulateArgs),
    /// Apply a layout to one record offline and print the packet.
    Format(FormatArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Simulate(args) => simulate::run(args),
        Command::Format(args) => format::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Listen on all interfaces instead of loopback only.
    #[arg(long)]
    pub public: bool,
    /// Layout config file. Default: the built-in 6-byte layout.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Serial device receiving packets.
    #[arg(long, env = "PADRELAY_DEVICE", default_value = DEFAULT_SERIAL_PATH)]
    pub device: PathBuf,
    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Serial I/O timeout (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub serial_timeout: String,
    /// Run without a device; packets are only logged.
    #[arg(long, conflicts_with = "device")]
    pub no_device: bool,
    /// Largest accepted record payload in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_packet_size: usize,
    /// Drop a connection after this long without data (e.g. 30s).
    #[arg(long)]
    pub read_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Relay address; the port defaults to 8080.
    #[arg(default_value = "127.0.0.1")]
    pub addr: String,
    /// Records per second.
    #[arg(long, default_value_t = 33.0)]
    pub hz: f64,
    /// Send random values instead of a smooth wave.
    #[arg(long)]
    pub random: bool,
    /// Stop after sending N records.
    #[arg(long)]
    pub count: Option<u64>,
    /// Give up on a send blocked longer than this (e.g. 500ms).
    #[arg(long)]
    pub write_timeout: Option<String>,
    /// Reconnect after a failed connect or send instead of exiting.
    #[arg(long)]
    pub reconnect: bool,
    /// Pause before each reconnect attempt.
    #[arg(long, default_value = "3s")]
    pub reconnect_delay: String,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Layout config file. Default: the built-in 6-byte layout.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// State record as JSON, e.g. '{"W":1,"LjoyX":152}'.
    #[arg(long, value_name = "JSON")]
    pub state: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Load the layout named on the command line, or the built-in one.
pub fn load_layout(config: Option<&Path>) -> CliResult<ByteLayout> {
    let Some(path) = config else {
        return Ok(ByteLayout::default());
    };

    let layout = ByteLayout::from_path(path)
        .map_err(|err| layout_error(&format!("failed loading {}", path.display()), err))?;
    for name in layout.unknown_fields() {
        warn!(config = %path.display(), field = %name, "unknown field reads as 0");
    }
    Ok(layout)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
