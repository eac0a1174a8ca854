use padrelay_session::{JsonRecordDecoder, RecordDecoder};

use crate::cmd::{load_layout, FormatArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: FormatArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = load_layout(args.config.as_deref())?;
    let record = JsonRecordDecoder
        .decode(args.state.as_bytes())
        .map_err(|err| session_error("invalid --state", err))?;

    let packet = layout.format(&record);
    print_packet(&packet, &record, &layout, format);
    Ok(SUCCESS)
}
