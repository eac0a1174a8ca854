use std::f64::consts::TAU;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use padrelay_frame::{FrameConfig, FrameWriter};
use padrelay_layout::{Field, StateRecord};
use padrelay_transport::RelayStream;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::cmd::serve::install_ctrlc_handler;
use crate::cmd::{parse_duration, SimulateArgs, DEFAULT_PORT};
use crate::exit::{frame_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};

/// Longest uninterrupted sleep while waiting to reconnect.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Axes driven by the wave (or randomized), with phase offsets in cycles.
const WAVE_AXES: [(Field, f64); 4] = [
    (Field::LeftX, 0.0),
    (Field::LeftY, 0.25),
    (Field::RightY, 0.5),
    (Field::RightTrigger, 0.125),
];

/// Buttons toggled every `period` whole seconds.
const BUTTON_PERIODS: [(Field, u64); 6] = [
    (Field::North, 2),
    (Field::East, 3),
    (Field::South, 5),
    (Field::West, 7),
    (Field::LeftBumper, 4),
    (Field::RightBumper, 6),
];

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let period = (args.hz.is_finite() && args.hz > 0.0)
        .then(|| Duration::try_from_secs_f64(1.0 / args.hz).ok())
        .flatten()
        .ok_or_else(|| CliError::new(USAGE, "--hz must be a positive number"))?;
    let config = frame_config(&args)?;
    let reconnect_delay = args
        .reconnect
        .then(|| parse_duration(&args.reconnect_delay))
        .transpose()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let addr = with_default_port(&args.addr);
    let mut producer = Producer {
        period,
        random: args.random,
        count: args.count,
        sent: 0,
        start: Instant::now(),
        rng: rand::rng(),
    };

    loop {
        match producer.stream_to(&addr, &config, &running) {
            Ok(()) => break,
            Err(err) => {
                let Some(delay) = reconnect_delay else {
                    return Err(err);
                };
                warn!(%addr, error = %err, ?delay, "reconnecting");
                if !sleep_while_running(delay, &running) {
                    break;
                }
            }
        }
    }

    info!(%addr, sent = producer.sent, "simulation finished");
    Ok(SUCCESS)
}

fn frame_config(args: &SimulateArgs) -> CliResult<FrameConfig> {
    Ok(FrameConfig {
        write_timeout: args.write_timeout.as_deref().map(parse_duration).transpose()?,
        ..FrameConfig::default()
    })
}

/// Sleep up to `delay`, waking early when `running` clears. Returns whether
/// the simulation should go on.
fn sleep_while_running(delay: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now() + delay;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
    }
    false
}

/// Generator state that survives reconnects.
struct Producer<R> {
    period: Duration,
    random: bool,
    count: Option<u64>,
    sent: u64,
    start: Instant,
    rng: R,
}

impl<R: Rng> Producer<R> {
    fn done(&self) -> bool {
        self.count.is_some_and(|count| self.sent >= count)
    }

    /// Connect and send records until done or stopped. Errors leave `sent`
    /// at the last record that was handed to the socket.
    fn stream_to(
        &mut self,
        addr: &str,
        config: &FrameConfig,
        running: &AtomicBool,
    ) -> CliResult<()> {
        let stream =
            RelayStream::connect(addr).map_err(|err| transport_error("connect failed", err))?;
        let mut writer = FrameWriter::with_config_tcp(stream, config.clone())
            .map_err(|err| frame_error("connect failed", err))?;
        info!(
            %addr,
            hz = 1.0 / self.period.as_secs_f64(),
            random = self.random,
            "simulating producer"
        );

        let mut next_tick = Instant::now();
        while running.load(Ordering::SeqCst) && !self.done() {
            let mut record = wave_record(self.start.elapsed());
            if self.random {
                randomize_axes(&mut record, &mut self.rng);
            }
            record.timestamp = now_millis();

            let mut payload = serde_json::to_vec(&record)
                .map_err(|err| CliError::new(DATA_INVALID, format!("encode failed: {err}")))?;
            payload.push(b'\n');
            writer
                .send(&payload)
                .map_err(|err| frame_error("send failed", err))?;
            self.sent += 1;
            debug!(sent = self.sent, %record, "sent record");

            next_tick += self.period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        }
        Ok(())
    }
}

/// Append the default port unless one is already given.
fn with_default_port(addr: &str) -> String {
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PORT).to_string();
    }
    match addr.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => addr.to_string(),
        _ => format!("{addr}:{DEFAULT_PORT}"),
    }
}

/// 0..=255, centered on 127, one cycle per second.
fn wave(t: f64, phase: f64) -> u8 {
    let s = 0.5 + 0.5 * (TAU * (t + phase)).sin();
    (s * 255.0) as u8
}

fn wave_record(elapsed: Duration) -> StateRecord {
    let t = elapsed.as_secs_f64();
    let secs = elapsed.as_secs();

    let mut record = StateRecord::default();
    for (field, phase) in WAVE_AXES {
        record.set(field, wave(t, phase));
    }
    for (field, period) in BUTTON_PERIODS {
        record.set(field, ((secs / period) % 2) as u8);
    }
    record
}

fn randomize_axes(record: &mut StateRecord, rng: &mut impl Rng) {
    for (field, _) in WAVE_AXES {
        record.set(field, rng.random());
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn default_port_is_appended_to_bare_hosts() {
        assert_eq!(with_default_port("10.0.0.2"), "10.0.0.2:8080");
        assert_eq!(with_default_port("relay.local"), "relay.local:8080");
        assert_eq!(with_default_port("::1"), "[::1]:8080");
        assert_eq!(with_default_port("[::1]"), "[::1]:8080");
    }

    #[test]
    fn explicit_port_is_kept() {
        assert_eq!(with_default_port("10.0.0.2:9000"), "10.0.0.2:9000");
        assert_eq!(with_default_port("relay.local:9000"), "relay.local:9000");
        assert_eq!(with_default_port("[::1]:9000"), "[::1]:9000");
    }

    #[test]
    fn wave_spans_the_axis_range() {
        assert_eq!(wave(0.0, 0.0), 127);
        assert_eq!(wave(0.0, 0.25), 255);
        assert_eq!(wave(0.0, 0.75), 0);
    }

    #[test]
    fn wave_record_toggles_buttons_on_their_periods() {
        let at_zero = wave_record(Duration::ZERO);
        assert_eq!(at_zero.north, 0);
        assert_eq!(at_zero.left_x, 127);
        assert_eq!(at_zero.left_y, 255);

        let at_two = wave_record(Duration::from_secs(2));
        assert_eq!(at_two.north, 1);
        assert_eq!(at_two.east, 0);

        let at_seven = wave_record(Duration::from_secs(7));
        assert_eq!(at_seven.west, 1);
        assert_eq!(at_seven.south, 1);
        assert_eq!(at_seven.right_bumper, 1);
    }

    fn args(extra: &[&str]) -> SimulateArgs {
        let mut argv = vec!["padrelay", "simulate"];
        argv.extend_from_slice(extra);
        let cli = crate::Cli::try_parse_from(argv).expect("simulate args should parse");
        match cli.command {
            crate::cmd::Command::Simulate(args) => args,
            other => panic!("expected simulate, got {other:?}"),
        }
    }

    #[test]
    fn write_timeout_reaches_frame_config() {
        let config = frame_config(&args(&["--write-timeout", "250ms"])).unwrap();
        assert_eq!(config.write_timeout, Some(Duration::from_millis(250)));
        assert_eq!(frame_config(&args(&[])).unwrap().write_timeout, None);
        assert!(frame_config(&args(&["--write-timeout", "soon"])).is_err());
    }

    #[test]
    fn reconnect_wait_stops_with_flag() {
        let running = AtomicBool::new(true);
        assert!(sleep_while_running(Duration::from_millis(10), &running));

        running.store(false, Ordering::SeqCst);
        let started = Instant::now();
        assert!(!sleep_while_running(Duration::from_secs(30), &running));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn producer_stops_at_count() {
        let producer = Producer {
            period: Duration::from_millis(10),
            random: false,
            count: Some(2),
            sent: 2,
            start: Instant::now(),
            rng: rand::rng(),
        };
        assert!(producer.done());
        assert!(!Producer { count: None, ..producer }.done());
    }

    #[test]
    fn random_mode_keeps_button_pattern() {
        let mut record = wave_record(Duration::from_secs(2));
        randomize_axes(&mut record, &mut rand::rng());
        assert_eq!(record.north, 1);
        assert_eq!(record.east, 0);
        assert_eq!(record.dpad_x, 0);
    }
}
