//! `tokio_util` codec adapter (requires the `async` feature).

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::assembler::PacketAssembler;
use crate::error::{ConfigError, FrameError, FramingError};
use crate::packet::Packet;

/// Decodes packets from an async byte stream via `FramedRead`.
///
/// Every call drains the read buffer into the assembler; packets that
/// complete together are queued and handed out one per `decode` call. A
/// strict-mode framing error is held back until the packets that completed
/// before it have been handed out.
#[derive(Debug)]
pub struct PacketCodec {
    assembler: PacketAssembler,
    ready: VecDeque<Packet>,
    pending: Option<FramingError>,
}

impl PacketCodec {
    pub fn new(assembler: PacketAssembler) -> Self {
        Self {
            assembler,
            ready: VecDeque::new(),
            pending: None,
        }
    }

    /// Accept a new packet type for bytes not yet decoded.
    pub fn register_type(&mut self, packet_type: u8, size: usize) -> Result<bool, ConfigError> {
        self.assembler.register_type(packet_type, size)
    }

    pub fn assembler(&self) -> &PacketAssembler {
        &self.assembler
    }

    pub fn into_assembler(self) -> PacketAssembler {
        self.assembler
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        if let Some(packet) = self.ready.pop_front() {
            return Ok(Some(packet));
        }
        if let Some(err) = self.pending.take() {
            return Err(err.into());
        }

        let ready = &mut self.ready;
        let result = self
            .assembler
            .ingest_with(&src[..], |packet, _| ready.push_back(packet.to_packet()));

        match result {
            Ok(()) => src.advance(src.len()),
            Err(err) => {
                src.advance(err.consumed);
                if self.ready.is_empty() {
                    return Err(err.into());
                }
                self.pending = Some(err);
            }
        }

        Ok(self.ready.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::config::AssemblerConfig;

    fn wire(packet_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xFE, 0xFE, 0xFE, packet_type];
        bytes.extend_from_slice(payload);
        bytes
    }

    fn codec(sizes: &[(u8, usize)]) -> PacketCodec {
        PacketCodec::new(
            PacketAssembler::new(AssemblerConfig::default(), sizes.iter().copied()).unwrap(),
        )
    }

    #[test]
    fn decode_queues_packets_from_one_buffer() {
        let mut codec = codec(&[(1, 2)]);
        let mut src = BytesMut::new();
        src.extend_from_slice(&wire(1, &[1, 1]));
        src.extend_from_slice(&wire(1, &[2, 2]));
        src.extend_from_slice(&[0xFE]);

        let first = codec.decode(&mut src).unwrap().unwrap();
        assert!(src.is_empty());
        let second = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), &[1, 1]);
        assert_eq!(second.payload.as_ref(), &[2, 2]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert_eq!(codec.assembler().remaining(), -1);
    }

    #[tokio::test]
    async fn framed_read_yields_packets() {
        let mut bytes = vec![0x00, 0x13];
        bytes.extend(wire(1, b"abc"));
        bytes.extend(wire(2, b"xy"));

        let mut framed = FramedRead::new(&bytes[..], codec(&[(1, 3), (2, 2)]));

        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(first, Packet::new(1, &b"abc"[..]));
        assert_eq!(second, Packet::new(2, &b"xy"[..]));
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn strict_codec_surfaces_framing_error() {
        let assembler =
            PacketAssembler::new(AssemblerConfig::default().strict(), [(1, 1)]).unwrap();
        let bytes = wire(5, &[]);
        let mut framed = FramedRead::new(&bytes[..], PacketCodec::new(assembler));

        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::Framing(_)));
    }

    #[tokio::test]
    async fn strict_codec_yields_earlier_packets_before_error() {
        let assembler =
            PacketAssembler::new(AssemblerConfig::default().strict(), [(1, 1)]).unwrap();
        let mut bytes = wire(1, &[0xAA]);
        bytes.extend(wire(1, &[0xBB]));
        bytes.extend(wire(9, &[]));
        let mut framed = FramedRead::new(&bytes[..], PacketCodec::new(assembler));

        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(first, Packet::new(1, vec![0xAA]));
        assert_eq!(second, Packet::new(1, vec![0xBB]));

        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::Framing(_)));
    }

    #[test]
    fn decode_keeps_bytes_after_framing_error() {
        let assembler =
            PacketAssembler::new(AssemblerConfig::default().strict(), [(1, 1)]).unwrap();
        let mut codec = PacketCodec::new(assembler);
        let mut src = BytesMut::new();
        src.extend_from_slice(&wire(1, &[0xAA]));
        src.extend_from_slice(&wire(9, &[]));
        src.extend_from_slice(&wire(1, &[0xCC]));

        let first = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(first, Packet::new(1, vec![0xAA]));
        assert_eq!(src.len(), 5);

        assert!(matches!(
            codec.decode(&mut src),
            Err(FrameError::Framing(_))
        ));
        let third = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(third, Packet::new(1, vec![0xCC]));
        assert!(src.is_empty());
    }
}
