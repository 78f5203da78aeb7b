use bytes::Bytes;

/// An assembled packet that owns its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The type byte that followed the header.
    pub packet_type: u8,
    /// The fixed-size payload.
    pub payload: Bytes,
}

impl Packet {
    /// Create a new packet.
    pub fn new(packet_type: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            packet_type,
            payload: payload.into(),
        }
    }
}

/// A packet borrowed from the assembler's internal buffer.
///
/// The payload is only valid until the assembler consumes more input. Use
/// [`PacketRef::to_packet`] to keep it longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRef<'a> {
    pub packet_type: u8,
    pub payload: &'a [u8],
}

impl PacketRef<'_> {
    /// Copy the payload out into an owned [`Packet`].
    pub fn to_packet(&self) -> Packet {
        Packet {
            packet_type: self.packet_type,
            payload: Bytes::copy_from_slice(self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_packet_copies_payload() {
        let buf = vec![0xAA, 0xBB];
        let packet = PacketRef {
            packet_type: 1,
            payload: &buf,
        }
        .to_packet();
        drop(buf);

        assert_eq!(packet.packet_type, 1);
        assert_eq!(packet.payload.as_ref(), &[0xAA, 0xBB]);
    }
}
