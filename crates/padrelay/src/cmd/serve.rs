use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use padrelay_frame::FrameConfig;
use padrelay_session::{NoDevice, RelayServer, SerialSinkFactory, SinkFactory};
use padrelay_transport::SerialConfig;

use crate::cmd::{load_layout, parse_duration, ServeArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    if args.max_packet_size == 0 {
        return Err(CliError::new(USAGE, "--max-packet-size must be greater than zero"));
    }

    let layout = Arc::new(load_layout(args.config.as_deref())?);
    let frame_config = FrameConfig {
        max_payload_size: args.max_packet_size,
        read_timeout: args.read_timeout.as_deref().map(parse_duration).transpose()?,
        ..FrameConfig::default()
    };
    let sinks = sink_factory(&args)?;

    let host = if args.public { "0.0.0.0" } else { "127.0.0.1" };
    let server = RelayServer::bind(format!("{host}:{}", args.port))
        .map_err(|err| session_error("bind failed", err))?
        .with_layout(layout)
        .with_sink_factory(sinks)
        .with_frame_config(frame_config);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    server
        .serve(&running)
        .map_err(|err| session_error("serve failed", err))?;
    Ok(SUCCESS)
}

fn sink_factory(args: &ServeArgs) -> CliResult<Arc<dyn SinkFactory>> {
    if args.no_device {
        return Ok(Arc::new(NoDevice));
    }
    Ok(Arc::new(SerialSinkFactory::new(SerialConfig {
        path: args.device.clone(),
        baud: args.baud,
        timeout: parse_duration(&args.serial_timeout)?,
    })))
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
