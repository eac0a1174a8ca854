use std::io::{self, Write};

use padrelay_transport::{SerialConfig, SerialPort};

/// Downstream consumer of formatted packets.
pub trait Sink: Send {
    /// Write one whole packet.
    fn write_packet(&mut self, packet: &[u8]) -> io::Result<()>;
}

impl Sink for SerialPort {
    fn write_packet(&mut self, packet: &[u8]) -> io::Result<()> {
        self.write_all(packet)?;
        self.flush()
    }
}

/// Opens a fresh sink for each session.
pub trait SinkFactory: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn Sink>>;

    /// Human-readable target, used in log lines.
    fn describe(&self) -> String;
}

/// Opens the configured serial device.
#[derive(Debug, Clone, Default)]
pub struct SerialSinkFactory {
    config: SerialConfig,
}

impl SerialSinkFactory {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl SinkFactory for SerialSinkFactory {
    fn open(&self) -> io::Result<Box<dyn Sink>> {
        let port = SerialPort::open(&self.config).map_err(|err| err.into_io())?;
        Ok(Box::new(port))
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.config.path.display(), self.config.baud)
    }
}

/// A factory that never yields a sink; sessions run log-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

impl SinkFactory for NoDevice {
    fn open(&self) -> io::Result<Box<dyn Sink>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no output device configured",
        ))
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}
