use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod replay;
pub mod version;

use replay::{parse_byte, parse_type_size, TypeSize};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a recorded serial session through the packet assembler.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Replay(args) => replay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file (length-prefixed chunk records) to replay.
    pub path: PathBuf,
    /// Treat the file as a plain byte dump instead of a chunk-record capture.
    #[arg(long)]
    pub raw: bool,
    /// Read size used to split a plain byte dump into chunks.
    #[arg(long, default_value = "255")]
    pub chunk_size: usize,
    /// Header marker byte (e.g. 0xFE).
    #[arg(long, default_value = "0xFE", value_parser = parse_byte)]
    pub header_byte: u8,
    /// Number of consecutive marker bytes in a header.
    #[arg(long, default_value = "3")]
    pub header_size: usize,
    /// Packet types accepted from the start (repeatable).
    #[arg(
        long = "type",
        value_name = "TYPE=SIZE",
        value_parser = parse_type_size,
        default_values = ["0x00=66"]
    )]
    pub types: Vec<TypeSize>,
    /// Packet types accepted once a boot packet arrives (repeatable).
    #[arg(
        long,
        value_name = "TYPE=SIZE",
        value_parser = parse_type_size,
        default_values = ["0x01=2252"]
    )]
    pub unlock: Vec<TypeSize>,
    /// Stop at the first framing anomaly.
    #[arg(long)]
    pub strict: bool,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
