use padrelay_frame::DEFAULT_MAX_PAYLOAD;
use padrelay_layout::{MAX_CONFIG_FILE_SIZE, MAX_OUTPUT_SIZE};

use crate::cmd::{VersionArgs, DEFAULT_PORT};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("padrelay {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: padrelay");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("PADRELAY_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("serial: {}", if cfg!(unix) { "termios" } else { "unsupported" });
    println!("default_port: {DEFAULT_PORT}");
    println!("max_payload: {DEFAULT_MAX_PAYLOAD}");
    println!("max_output_size: {MAX_OUTPUT_SIZE}");
    println!("max_config_file_size: {MAX_CONFIG_FILE_SIZE}");

    Ok(SUCCESS)
}
