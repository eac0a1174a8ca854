use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default serial device for USB-attached microcontrollers on Linux.
pub const DEFAULT_SERIAL_PATH: &str = "/dev/ttyACM0";

/// Default line speed.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial line configuration. Framing is always 8N1, raw mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device node to open.
    pub path: PathBuf,
    /// Line speed in baud.
    pub baud: u32,
    /// Read timeout applied through termios `VTIME` (decisecond resolution).
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SERIAL_PATH),
            baud: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(100),
        }
    }
}

/// An open, configured serial device.
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open and configure a serial device.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let path = config.path.clone();
        let file = open_device(&path).map_err(|e| TransportError::Serial {
            path: path.clone(),
            source: e,
        })?;

        configure_line(&file, config).map_err(|e| TransportError::Serial {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), baud = config.baud, "serial device opened");
        Ok(Self { file, path })
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "serial device closed");
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(unix)]
fn open_device(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
}

#[cfg(not(unix))]
fn open_device(_path: &Path) -> std::io::Result<File> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "serial devices are only supported on unix",
    ))
}

#[cfg(unix)]
fn configure_line(file: &File, config: &SerialConfig) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let speed = speed_for(config.baud).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unsupported baud rate {}", config.baud),
        )
    })?;
    let fd = file.as_raw_fd();

    // SAFETY: termios is plain old data; tcgetattr fully initializes it on success.
    let mut tty: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `fd` is an open descriptor owned by `file` and `tty` is a valid
    // writable termios for the duration of each call below.
    unsafe {
        if libc::tcgetattr(fd, &mut tty) != 0 {
            return Err(std::io::Error::last_os_error());
        }

        libc::cfmakeraw(&mut tty);
        tty.c_cflag |= libc::CLOCAL | libc::CREAD;
        tty.c_cflag &= !(libc::CSTOPB | libc::PARENB | libc::CSIZE);
        tty.c_cflag |= libc::CS8;
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cc[libc::VTIME] = deciseconds(config.timeout);

        if libc::cfsetispeed(&mut tty, speed) != 0 || libc::cfsetospeed(&mut tty, speed) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tty) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_line(_file: &File, _config: &SerialConfig) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn speed_for(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}

#[cfg_attr(not(unix), allow(dead_code))]
fn deciseconds(timeout: Duration) -> u8 {
    let tenths = timeout.as_millis().div_ceil(100);
    u8::try_from(tenths).unwrap_or(u8::MAX)
}
