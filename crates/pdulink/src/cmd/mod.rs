use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod channels;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a PDU definition and print its field layout.
    Schema(SchemaArgs),
    /// Load a channel config and print the configured channels.
    Channels(ChannelsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Schema(args) => schema::run(args, format),
        Command::Channels(args) => channels::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Type key to inspect, e.g. "geometry_msgs/Twist".
    pub type_key: String,
    /// Directory holding the .offset definition files.
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,
}

#[derive(Args, Debug)]
pub struct ChannelsArgs {
    /// Config name relative to the root, without the .json extension.
    pub config: String,
    /// Directory holding the configuration files.
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,
    /// Limit output to one robot.
    #[arg(long)]
    pub robot: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}
