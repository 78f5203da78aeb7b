use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};

use tickframe_capture::{CaptureError, CaptureReader};
use tickframe_frame::{AssemblerConfig, PacketAssembler, BOOT, DEFAULT_MAX_PAYLOAD};

use crate::cmd::ReplayArgs;
use crate::exit::{
    capture_error, config_error, framing_error, io_error, CliError, CliResult, SUCCESS, USAGE,
};
use crate::output::{print_packet, print_stats, OutputFormat};

/// A `TYPE=SIZE` pair from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeSize {
    pub packet_type: u8,
    pub size: usize,
}

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }

    let config = AssemblerConfig {
        header_byte: args.header_byte,
        header_size: args.header_size,
        max_payload_size: DEFAULT_MAX_PAYLOAD,
        strict: args.strict,
    };
    let assembler = PacketAssembler::new(
        config,
        args.types.iter().map(|t| (t.packet_type, t.size)),
    )
    .map_err(|err| config_error("invalid assembler configuration", err))?;

    let file = File::open(&args.path)
        .map_err(|err| io_error(&format!("failed opening {}", args.path.display()), err))?;

    let mut session = Session {
        assembler,
        unlock: args.unlock.clone(),
        format,
        printed: 0,
        count: args.count,
    };

    if args.raw {
        replay_raw(file, args.chunk_size, &mut session)?;
    } else {
        replay_capture(file, &mut session)?;
    }

    let stats = session.assembler.stats();
    tracing::info!(
        packets = stats.packets,
        bytes = stats.bytes_ingested,
        discarded = stats.discarded_bytes,
        unknown_types = stats.unknown_types,
        "replay finished"
    );
    print_stats(&stats, format).map_err(|err| io_error("failed writing summary", err))?;

    Ok(SUCCESS)
}

struct Session {
    assembler: PacketAssembler,
    unlock: Vec<TypeSize>,
    format: OutputFormat,
    printed: usize,
    count: Option<usize>,
}

impl Session {
    fn done(&self) -> bool {
        self.count.is_some_and(|count| self.printed >= count)
    }

    /// Feed one chunk; returns false once enough packets were printed.
    fn feed(&mut self, chunk: &[u8]) -> CliResult<bool> {
        let mut rest = chunk;
        while !rest.is_empty() && !self.done() {
            let (used, packet) = self
                .assembler
                .next_packet(rest)
                .map_err(|err| framing_error("replay stopped", err))?;
            rest = &rest[used..];

            let Some(packet) = packet else {
                continue;
            };
            print_packet(self.printed, &packet, self.format)
                .map_err(|err| io_error("failed writing packet", err))?;
            let is_boot = packet.packet_type == BOOT;
            self.printed += 1;

            if is_boot {
                tracing::info!("boot packet received, unlocking data packet types");
                for t in &self.unlock {
                    self.assembler
                        .register_type(t.packet_type, t.size)
                        .map_err(|err| config_error("invalid unlock type", err))?;
                }
            }
        }
        Ok(!self.done())
    }
}

fn replay_capture(file: File, session: &mut Session) -> CliResult<()> {
    let mut reader = CaptureReader::new(BufReader::new(file));
    loop {
        let chunk = match reader.next_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(CaptureError::Truncated { expected, got }) => {
                tracing::warn!(expected, got, "capture ends mid-record, stopping replay");
                break;
            }
            Err(err) => return Err(capture_error("failed reading capture", err)),
        };

        if !session.feed(&chunk)? {
            break;
        }
    }
    tracing::debug!(records = reader.records(), bytes = reader.bytes(), "capture consumed");
    Ok(())
}

fn replay_raw(mut file: File, chunk_size: usize, session: &mut Session) -> CliResult<()> {
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let read = match file.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("failed reading byte dump", err)),
        };

        if !session.feed(&chunk[..read])? {
            return Ok(());
        }
    }
}

/// Parse a byte written as `0xNN` or decimal.
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid byte value: {input}"))
}

/// Parse a `TYPE=SIZE` pair, e.g. `0x01=2252`.
pub fn parse_type_size(input: &str) -> Result<TypeSize, String> {
    let (packet_type, size) = input
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=SIZE, got: {input}"))?;
    let packet_type = parse_byte(packet_type)?;
    let size = size
        .trim()
        .parse()
        .map_err(|_| format!("invalid payload size: {size}"))?;
    Ok(TypeSize { packet_type, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_byte_hex_and_decimal() {
        assert_eq!(parse_byte("0xFE").unwrap(), 0xFE);
        assert_eq!(parse_byte("0x0a").unwrap(), 10);
        assert_eq!(parse_byte("254").unwrap(), 254);
    }

    #[test]
    fn parse_byte_rejects_out_of_range() {
        assert!(parse_byte("0x100").is_err());
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("fe").is_err());
    }

    #[test]
    fn parse_type_size_pairs() {
        assert_eq!(
            parse_type_size("0x01=2252").unwrap(),
            TypeSize {
                packet_type: 1,
                size: 2252
            }
        );
        assert!(parse_type_size("0x01").is_err());
        assert!(parse_type_size("0x01=-4").is_err());
    }

    #[test]
    fn session_unlocks_after_boot_within_one_chunk() {
        let assembler = PacketAssembler::new(AssemblerConfig::default(), [(BOOT, 1)]).unwrap();
        let mut session = Session {
            assembler,
            unlock: vec![TypeSize {
                packet_type: 0x01,
                size: 2,
            }],
            format: OutputFormat::Raw,
            printed: 0,
            count: None,
        };

        let chunk = [
            0xFE, 0xFE, 0xFE, 0x00, 0xB0, 0xFE, 0xFE, 0xFE, 0x01, 0xD0, 0xD1,
        ];
        assert!(session.feed(&chunk).unwrap());
        assert_eq!(session.printed, 2);
    }

    #[test]
    fn session_stops_at_count() {
        let assembler = PacketAssembler::new(AssemblerConfig::default(), [(BOOT, 1)]).unwrap();
        let mut session = Session {
            assembler,
            unlock: Vec::new(),
            format: OutputFormat::Raw,
            printed: 0,
            count: Some(1),
        };

        let chunk = [0xFE, 0xFE, 0xFE, 0x00, 0x01, 0xFE, 0xFE, 0xFE, 0x00, 0x02];
        assert!(!session.feed(&chunk).unwrap());
        assert_eq!(session.printed, 1);
        assert_eq!(session.assembler.stats().packets, 1);
    }
}
