use std::fmt;
use std::io;

use tickframe_capture::CaptureError;
use tickframe_frame::{ConfigError, FramingError};

// Exit codes shared with the other serial tooling.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn framing_error(context: &str, err: FramingError) -> CliError {
    let last = match &err.last_packet {
        Some(packet) => format!(
            "last good packet: type {:#04x}, {} bytes",
            packet.packet_type,
            packet.payload.len()
        ),
        None => "no packet assembled yet".to_string(),
    };
    CliError::new(DATA_INVALID, format!("{context}: {err} ({last})"))
}

pub fn capture_error(context: &str, err: CaptureError) -> CliError {
    match err {
        CaptureError::Io(source) => io_error(context, source),
        other @ CaptureError::Truncated { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {other}"))
        }
    }
}
