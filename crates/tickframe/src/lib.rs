//! Packet framing for serial-attached sensor modules.
//!
//! # Crate Structure
//!
//! - [`frame`]: Header-synchronized packet assembly over arbitrary byte chunks
//! - [`capture`]: Chunk-record captures for recording and replaying serial sessions

/// Re-export frame types.
pub mod frame {
    pub use tickframe_frame::*;
}

/// Re-export capture types.
pub mod capture {
    pub use tickframe_capture::*;
}
