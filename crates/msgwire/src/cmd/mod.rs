use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use msgwire_frame::PrefixWidth;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

/// Default endpoint address; port 3000 matches the protocol default.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a server that echoes every message back to its sender.
    Echo(EchoArgs),
    /// Send a single message.
    Send(SendArgs),
    /// Listen and print received messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Length-prefix width as a CLI value.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum PrefixWidthArg {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
    #[value(name = "4")]
    Four,
}

impl From<PrefixWidthArg> for PrefixWidth {
    fn from(arg: PrefixWidthArg) -> Self {
        match arg {
            PrefixWidthArg::One => PrefixWidth::One,
            PrefixWidthArg::Two => PrefixWidth::Two,
            PrefixWidthArg::Four => PrefixWidth::Four,
        }
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to bind.
    #[arg(default_value = DEFAULT_ADDR)]
    pub addr: String,
    /// Length-prefix width in bytes (must match connecting clients).
    #[arg(long, default_value = "1")]
    pub prefix_width: PrefixWidthArg,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to.
    #[arg(default_value = DEFAULT_ADDR)]
    pub addr: String,
    /// Length-prefix width in bytes (must match the server).
    #[arg(long, default_value = "1")]
    pub prefix_width: PrefixWidthArg,
    /// JSON object payload.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON object payload from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Set the message `type` tag.
    #[arg(long = "type", value_name = "TYPE")]
    pub msg_type: Option<String>,
    /// Wait for the correlated reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind.
    #[arg(default_value = DEFAULT_ADDR)]
    pub addr: String,
    /// Length-prefix width in bytes (must match connecting clients).
    #[arg(long, default_value = "1")]
    pub prefix_width: PrefixWidthArg,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
