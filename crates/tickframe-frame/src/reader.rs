use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::assembler::PacketAssembler;
use crate::error::{ConfigError, FrameError, Result};
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete packets from any `Read` byte source.
///
/// Bytes read past the end of a packet are held back until the next call,
/// so types registered after a packet is returned already apply to the
/// bytes that followed it.
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
    assembler: PacketAssembler,
}

impl<T: Read> PacketReader<T> {
    /// Create a packet reader driving the given assembler.
    pub fn new(inner: T, assembler: PacketAssembler) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            assembler,
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached. A
    /// strict-mode `FrameError::Framing` skips the offending bytes, so the
    /// next call continues with the input that followed them.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if !self.buf.is_empty() {
                let (used, packet) = match self.assembler.next_packet(&self.buf) {
                    Ok((used, packet)) => (used, packet.map(|p| p.to_packet())),
                    Err(err) => {
                        self.buf.advance(err.consumed);
                        return Err(err.into());
                    }
                };
                self.buf.advance(used);
                if let Some(packet) = packet {
                    return Ok(packet);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Accept a new packet type for the rest of the stream.
    pub fn register_type(
        &mut self,
        packet_type: u8,
        size: usize,
    ) -> std::result::Result<bool, ConfigError> {
        self.assembler.register_type(packet_type, size)
    }

    /// Borrow the underlying byte source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying byte source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn assembler(&self) -> &PacketAssembler {
        &self.assembler
    }

    pub fn assembler_mut(&mut self) -> &mut PacketAssembler {
        &mut self.assembler
    }

    /// Consume the reader and return the inner byte source.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<Packet>;

    /// Yields packets until EOF, which ends iteration instead of erroring.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_packet() {
            Ok(packet) => Some(Ok(packet)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
