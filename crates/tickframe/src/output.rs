use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tickframe_frame::packet_type::type_name;
use tickframe_frame::{AssemblerStats, PacketRef};

/// Payload bytes shown by the table and pretty formats.
const PREVIEW_BYTES: usize = 32;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    index: usize,
    packet_type: u8,
    type_name: &'a str,
    payload_size: usize,
    payload: String,
}

#[derive(Serialize)]
struct StatsOutput {
    summary: bool,
    bytes_ingested: u64,
    packets: u64,
    discarded_bytes: u64,
    broken_headers: u64,
    unknown_types: u64,
    overflows: u64,
}

/// Print one packet to stdout.
pub fn print_packet(index: usize, packet: &PacketRef<'_>, format: OutputFormat) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write_packet(&mut out, index, packet, format)?;
    out.flush()
}

/// Print end-of-replay counters to stdout.
pub fn print_stats(stats: &AssemblerStats, format: OutputFormat) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write_stats(&mut out, stats, format)?;
    out.flush()
}

fn write_packet<W: Write>(
    out: &mut W,
    index: usize,
    packet: &PacketRef<'_>,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = PacketOutput {
                index,
                packet_type: packet.packet_type,
                type_name: type_name(packet.packet_type),
                payload_size: packet.payload.len(),
                payload: hex(packet.payload),
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TYPE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    format!("{:#04x} {}", packet.packet_type, type_name(packet.packet_type)),
                    packet.payload.len().to_string(),
                    payload_preview(packet.payload),
                ]);
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => writeln!(
            out,
            "#{} type={:#04x} ({}) size={} payload={}",
            index,
            packet.packet_type,
            type_name(packet.packet_type),
            packet.payload.len(),
            payload_preview(packet.payload)
        ),
        OutputFormat::Raw => out.write_all(packet.payload),
    }
}

// Raw output stays payload-only.
fn write_stats<W: Write>(
    out: &mut W,
    stats: &AssemblerStats,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = StatsOutput {
                summary: true,
                bytes_ingested: stats.bytes_ingested,
                packets: stats.packets,
                discarded_bytes: stats.discarded_bytes,
                broken_headers: stats.broken_headers,
                unknown_types: stats.unknown_types,
                overflows: stats.overflows,
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["COUNTER", "VALUE"])
                .add_row(vec!["bytes ingested".to_string(), stats.bytes_ingested.to_string()])
                .add_row(vec!["packets".to_string(), stats.packets.to_string()])
                .add_row(vec!["discarded bytes".to_string(), stats.discarded_bytes.to_string()])
                .add_row(vec!["broken headers".to_string(), stats.broken_headers.to_string()])
                .add_row(vec!["unknown types".to_string(), stats.unknown_types.to_string()])
                .add_row(vec!["overflows".to_string(), stats.overflows.to_string()]);
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => writeln!(
            out,
            "packets={} bytes={} discarded={} broken_headers={} unknown_types={} overflows={}",
            stats.packets,
            stats.bytes_ingested,
            stats.discarded_bytes,
            stats.broken_headers,
            stats.unknown_types,
            stats.overflows
        ),
        OutputFormat::Raw => Ok(()),
    }
}

fn payload_preview(payload: &[u8]) -> String {
    if payload.len() <= PREVIEW_BYTES {
        return hex(payload);
    }
    format!(
        "{}.. (+{} bytes)",
        hex(&payload[..PREVIEW_BYTES]),
        payload.len() - PREVIEW_BYTES
    )
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
