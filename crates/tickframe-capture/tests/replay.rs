use std::io::Cursor;

use tickframe_capture::{CaptureReader, CaptureWriter};
use tickframe_frame::{AssemblerConfig, PacketAssembler, BOOT, DATA};

fn wire(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFE, 0xFE, packet_type];
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn replayed_capture_reassembles_session() {
    let mut stream = vec![0x00, 0x7F, 0xFE, 0x01];
    stream.extend(wire(BOOT, &[0xB0; 8]));
    for i in 0..4u8 {
        stream.extend(wire(DATA, &[i; 20]));
    }

    // Odd chunk sizes, as a serial driver would deliver them.
    let mut writer = CaptureWriter::new(Vec::new());
    for chunk in stream.chunks(7) {
        writer.write_chunk(chunk).unwrap();
    }
    let capture = writer.into_inner();

    let mut asm = PacketAssembler::new(AssemblerConfig::default(), [(BOOT, 8)]).unwrap();
    let mut packets = Vec::new();
    for chunk in CaptureReader::new(Cursor::new(capture)) {
        let chunk = chunk.unwrap();
        asm.ingest_with(&chunk, |packet, types| {
            if packet.packet_type == BOOT {
                types.register(DATA, 20).unwrap();
            }
            packets.push(packet.to_packet());
        })
        .unwrap();
    }

    assert_eq!(packets.len(), 5);
    assert_eq!(packets[0].packet_type, BOOT);
    assert!(packets[1..].iter().all(|p| p.packet_type == DATA));
    assert_eq!(packets[4].payload.as_ref(), &[3u8; 20]);
    assert_eq!(asm.stats().bytes_ingested, stream.len() as u64);
}
