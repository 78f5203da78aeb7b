use crate::assembler::Anomaly;
use crate::packet::Packet;

/// Invalid assembler construction or type registration parameters.
///
/// Fatal to the call that produced it, never to the assembler instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A header must consist of at least one marker byte.
    #[error("header size must be at least 1")]
    HeaderSizeZero,

    /// The declared payload size exceeds the configured maximum.
    #[error("payload size for type {packet_type:#04x} too large ({size} bytes, max {max})")]
    PayloadTooLarge {
        packet_type: u8,
        size: usize,
        max: usize,
    },
}

/// A framing anomaly surfaced by a strict-mode assembler.
#[derive(Debug, Clone, thiserror::Error)]
#[error("framing error: {anomaly}")]
pub struct FramingError {
    /// What went wrong.
    pub anomaly: Anomaly,
    /// The last packet assembled successfully before the anomaly, if any.
    pub last_packet: Option<Packet>,
    /// Bytes of the failing call's input consumed up to and including the
    /// byte that raised the anomaly. Input past this offset was not fed.
    pub consumed: usize,
}

/// Errors produced by the stream adapters built on the assembler.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Invalid assembler configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A strict-mode framing anomaly.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// An I/O error occurred while reading the byte source.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte source reached EOF before another packet completed.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
