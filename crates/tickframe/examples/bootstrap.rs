//! Accept data packets only after the device has announced itself.
//!
//! Run with: `cargo run --example bootstrap`

use tickframe::frame::{
    AssemblerConfig, PacketAssembler, BOOT, BOOT_PAYLOAD_SIZE, DATA, DATA_PAYLOAD_SIZE,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut assembler = PacketAssembler::new(AssemblerConfig::default(), [(BOOT, BOOT_PAYLOAD_SIZE)])?;
    assembler.set_anomaly_hook(|anomaly| eprintln!("anomaly: {anomaly}"));

    // A data packet before boot, the boot packet, then two data packets.
    let mut stream = Vec::new();
    for (packet_type, size) in [
        (DATA, DATA_PAYLOAD_SIZE),
        (BOOT, BOOT_PAYLOAD_SIZE),
        (DATA, DATA_PAYLOAD_SIZE),
        (DATA, DATA_PAYLOAD_SIZE),
    ] {
        stream.extend([0xFE, 0xFE, 0xFE, packet_type]);
        stream.extend(std::iter::repeat(packet_type).take(size));
    }

    // Serial drivers hand out small chunks.
    for chunk in stream.chunks(255) {
        assembler.ingest_with(chunk, |packet, types| {
            println!(
                "packet type={:#04x} size={}",
                packet.packet_type,
                packet.payload.len()
            );
            if packet.packet_type == BOOT {
                if let Err(err) = types.register(DATA, DATA_PAYLOAD_SIZE) {
                    eprintln!("cannot unlock data packets: {err}");
                }
            }
        })?;
    }

    println!("{:?}", assembler.stats());
    Ok(())
}
