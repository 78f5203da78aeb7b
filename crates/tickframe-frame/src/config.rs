/// Default header marker byte.
pub const DEFAULT_HEADER_BYTE: u8 = 0xFE;

/// Default number of consecutive marker bytes that open a packet.
pub const DEFAULT_HEADER_SIZE: usize = 3;

/// Default upper bound on any registered payload size: 64 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// Configuration for a packet assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Marker byte repeated at the start of every packet. Default: `0xFE`.
    pub header_byte: u8,
    /// Number of consecutive marker bytes forming a header. Default: 3.
    pub header_size: usize,
    /// Largest payload size that may be registered. Default: 64 KiB.
    pub max_payload_size: usize,
    /// Return an error on framing anomalies instead of resynchronizing
    /// silently. Default: false.
    pub strict: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            header_byte: DEFAULT_HEADER_BYTE,
            header_size: DEFAULT_HEADER_SIZE,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            strict: false,
        }
    }
}

impl AssemblerConfig {
    /// Config with the given header marker and default limits.
    pub fn with_header(header_byte: u8, header_size: usize) -> Self {
        Self {
            header_byte,
            header_size,
            ..Self::default()
        }
    }

    /// Same config with strict mode switched on.
    pub fn strict(self) -> Self {
        Self {
            strict: true,
            ..self
        }
    }
}
