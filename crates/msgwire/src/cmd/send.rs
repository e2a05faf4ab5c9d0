use std::fs;
use std::time::Duration;

use msgwire_frame::FrameConfig;
use msgwire_peer::{Client, Message};

use crate::cmd::SendArgs;
use crate::exit::{peer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let config = FrameConfig::with_width(args.prefix_width.into());

    let client = Client::connect_with_config(&args.addr, config)
        .map_err(|err| peer_error("connect failed", err))?;

    let message = resolve_message(&args)?;

    if args.wait {
        let reply = client
            .request_with_timeout(message, wait_timeout)
            .map_err(|err| peer_error("request failed", err))?;
        print_message(&reply, &client.peer_addr().to_string(), format);
    } else {
        client
            .send(message)
            .map_err(|err| peer_error("send failed", err))?;
    }

    Ok(SUCCESS)
}

fn resolve_message(args: &SendArgs) -> CliResult<Message> {
    let mut message = if let Some(json) = &args.json {
        serde_json::from_str::<Message>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not a JSON object: {err}")))?
    } else if let Some(path) = &args.file {
        let text = fs::read_to_string(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        })?;
        serde_json::from_str::<Message>(&text).map_err(|err| {
            CliError::new(
                USAGE,
                format!("{} is not a JSON object: {err}", path.display()),
            )
        })?
    } else {
        Message::new()
    };

    if let Some(kind) = &args.msg_type {
        message.kind = Some(kind.clone());
    }

    Ok(message)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
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
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
