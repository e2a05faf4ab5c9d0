use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use msgwire_frame::{FrameConfig, FrameError, FrameReader};
use msgwire_peer::Message;
use msgwire_transport::WireListener;

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        WireListener::bind(&args.addr).map_err(|err| transport_error("bind failed", err))?;
    let config = FrameConfig::with_width(args.prefix_width.into());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let stream = match listener.accept() {
            Ok(stream) => stream,
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        let peer = stream.peer_addr().to_string();
        let mut reader = FrameReader::with_config_stream(stream, config.clone())
            .map_err(|err| frame_error("reader setup failed", err))?;

        while running.load(Ordering::SeqCst) {
            let value = match reader.read_message() {
                Ok(value) => value,
                Err(FrameError::ConnectionClosed) => break,
                Err(FrameError::MalformedFrame(err)) => {
                    tracing::warn!(error = %err, "discarding malformed frame");
                    continue;
                }
                Err(err) => return Err(frame_error("receive failed", err)),
            };

            let message = match Message::from_value(value) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(error = %err, "dropping non-object message");
                    continue;
                }
            };

            print_message(&message, &peer, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
