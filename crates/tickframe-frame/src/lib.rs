//! Streaming packet assembly for fixed-size typed packets over noisy serial links.
//!
//! Every packet on the wire is:
//! - A header: one marker byte (default `0xFE`) repeated (default 3 times)
//! - A 1-byte packet type
//! - A payload whose length is looked up from the type, never sent
//!
//! Input may arrive in chunks of any size. Noise between packets, broken
//! headers and unknown types are dropped and the stream resynchronizes on
//! the next header.

pub mod assembler;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod error;
pub mod packet;
pub mod packet_type;
pub mod reader;
pub mod types;

pub use assembler::{Anomaly, AnomalyHook, AssemblerStats, PacketAssembler, State};
#[cfg(feature = "async")]
pub use codec::PacketCodec;
pub use config::{AssemblerConfig, DEFAULT_HEADER_BYTE, DEFAULT_HEADER_SIZE, DEFAULT_MAX_PAYLOAD};
pub use error::{ConfigError, FrameError, FramingError, Result};
pub use packet::{Packet, PacketRef};
pub use packet_type::{BOOT, BOOT_PAYLOAD_SIZE, DATA, DATA_PAYLOAD_SIZE};
pub use reader::PacketReader;
pub use types::{TypeRegistrar, TypeTable};
