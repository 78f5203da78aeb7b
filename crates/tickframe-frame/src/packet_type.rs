//! Well-known packet types of the clock logger firmware.
//!
//! The firmware announces itself with a single boot packet after reset and
//! only then streams data packets. A receiver therefore starts out accepting
//! [`BOOT`] alone and registers [`DATA`] once the boot packet has arrived.

/// Boot packet: device identity, build provenance and initial GPS time.
pub const BOOT: u8 = 0x00;

/// Data packet: sample counters followed by raw ADC samples.
pub const DATA: u8 = 0x01;

/// Payload size of a boot packet.
pub const BOOT_PAYLOAD_SIZE: usize = 66;

/// Bytes preceding the raw samples in a data packet.
pub const DATA_PREAMBLE_SIZE: usize = 52;

/// Raw sample bytes carried by a data packet.
pub const DATA_SAMPLE_BYTES: usize = 2200;

/// Payload size of a data packet.
pub const DATA_PAYLOAD_SIZE: usize = DATA_PREAMBLE_SIZE + DATA_SAMPLE_BYTES;

/// Returns a human-readable name for a packet type.
pub fn type_name(packet_type: u8) -> &'static str {
    match packet_type {
        BOOT => "BOOT",
        DATA => "DATA",
        _ => "OTHER",
    }
}
