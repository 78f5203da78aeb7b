//! Chunk-record captures of raw serial traffic.
//!
//! A capture is a sequence of records, one per chunk delivered by the serial
//! driver:
//!
//! ```text
//! ┌──────────────┬──────────────────┐
//! │ Length       │ Chunk            │
//! │ (2B LE)      │ (Length bytes)   │
//! └──────────────┴──────────────────┘
//! ```
//!
//! Replaying a capture feeds the assembler the exact chunk boundaries the
//! live session saw.

pub mod error;
pub mod record;

pub use error::{CaptureError, Result};
pub use record::{CaptureReader, CaptureWriter, MAX_RECORD_LEN, RECORD_HEADER_SIZE};
