use msgwire_frame::FrameConfig;
use msgwire_peer::{Message, Router, Server};

use crate::cmd::EchoArgs;
use crate::exit::{peer_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    let router = Router::new().on_default(|message, reply| {
        tracing::info!(kind = ?message.kind, id = ?message.id, "echoing message");

        let mut response = Message::new();
        response.kind = message.kind.clone();
        response.fields = message.fields.clone();
        if let Err(err) = reply.send(response) {
            tracing::warn!(error = %err, "echo reply failed");
        }
    });

    let config = FrameConfig::with_width(args.prefix_width.into());
    let server = Server::bind_with_config(&args.addr, router, config)
        .map_err(|err| peer_error("bind failed", err))?;

    install_ctrlc_handler()?;

    server
        .serve()
        .map_err(|err| peer_error("accept failed", err))?;

    Ok(SUCCESS)
}

fn install_ctrlc_handler() -> CliResult<()> {
    ctrlc::set_handler(|| {
        std::process::exit(SUCCESS);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
