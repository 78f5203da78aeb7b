mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tickframe", version, about = "Serial packet framing diagnostics")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_with_defaults() {
        let cli = Cli::try_parse_from(["tickframe", "replay", "/tmp/binaryPackets"])
            .expect("replay args should parse");

        let Command::Replay(args) = cli.command else {
            panic!("expected replay subcommand");
        };
        assert_eq!(args.header_byte, 0xFE);
        assert_eq!(args.header_size, 3);
        assert_eq!(args.types.len(), 1);
        assert_eq!(args.types[0].packet_type, 0x00);
        assert_eq!(args.types[0].size, 66);
        assert_eq!(args.unlock[0].size, 2252);
        assert!(!args.strict);
    }

    #[test]
    fn repeated_type_flags_replace_defaults() {
        let cli = Cli::try_parse_from([
            "tickframe",
            "replay",
            "dump.bin",
            "--raw",
            "--type",
            "0x10=4",
            "--type",
            "0x11=0",
            "--header-byte",
            "0xAA",
        ])
        .expect("replay args should parse");

        let Command::Replay(args) = cli.command else {
            panic!("expected replay subcommand");
        };
        assert!(args.raw);
        assert_eq!(args.header_byte, 0xAA);
        let types: Vec<(u8, usize)> = args.types.iter().map(|t| (t.packet_type, t.size)).collect();
        assert_eq!(types, vec![(0x10, 4), (0x11, 0)]);
    }

    #[test]
    fn rejects_malformed_type_flag() {
        let err = Cli::try_parse_from(["tickframe", "replay", "x", "--type", "0x10"])
            .expect_err("malformed type should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::try_parse_from(["tickframe", "version", "--extended"])
            .expect("version args should parse");
        assert!(matches!(cli.command, Command::Version(_)));
    }
}
