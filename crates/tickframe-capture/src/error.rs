/// Errors that can occur while reading or writing a capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The capture ended inside a record.
    #[error("truncated capture record ({got} of {expected} bytes)")]
    Truncated { expected: usize, got: usize },

    /// An I/O error occurred on the capture stream.
    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
