//! BMD101 serial protocol constants.
//!
//! Frame layout:
//!
//! ```text
//! SYNC(0xAA) SYNC(0xAA) LEN(0..=255) PAYLOAD[LEN] CHECKSUM
//! ```
//!
//! The checksum is the bitwise complement of the 8-bit truncated sum of the
//! payload bytes. Payload codes below `0x80` carry a single value byte, codes
//! at or above `0x80` carry an explicit length byte.

use heapless::Vec;

// =============================================================================
// Framing
// =============================================================================

/// Sync byte, sent twice at the start of every frame.
pub const SYNC: u8 = 0xAA;

/// Largest payload a single length byte can declare.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Largest complete frame on the wire (sync, sync, length, payload, checksum).
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + 4;

// =============================================================================
// Payload Codes
// =============================================================================

/// Extended code level marker, carries no data.
pub const CODE_EXTENDED: u8 = 0x55;

/// Signal quality, 1 byte (0 = sensor off, 200 = sensor on).
pub const CODE_SIGNAL_QUALITY: u8 = 0x02;

/// Real-time heart rate in beats per minute, 1 byte.
pub const CODE_HEART_RATE: u8 = 0x03;

/// Unused 1-byte code.
pub const CODE_DONT_CARE_1: u8 = 0x08;

/// Raw ECG sample: length byte (2) then a big-endian two's-complement i16.
pub const CODE_RAW_ECG: u8 = 0x80;

/// Unused length-prefixed code (5 data bytes).
pub const CODE_DONT_CARE_2: u8 = 0x84;

/// Unused length-prefixed code (3 data bytes).
pub const CODE_DONT_CARE_3: u8 = 0x85;

/// Codes at or above this value carry a length byte.
pub const MULTI_BYTE_CODE_MIN: u8 = 0x80;

/// Declared length of a raw ECG value.
pub const RAW_ECG_LEN: u8 = 2;

/// Signal quality reported when the electrodes are not touched.
pub const SENSOR_OFF: u8 = 0;

/// Signal quality reported when the electrodes have good contact.
pub const SENSOR_ON: u8 = 200;

// =============================================================================
// Encoding
// =============================================================================

/// Checksum of a payload: complement of the truncated 8-bit sum.
pub fn checksum(payload: &[u8]) -> u8 { !payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) }

/// Build a complete frame around `payload`.
///
/// Returns `None` when the payload does not fit a single length byte.
pub fn encode_frame(payload: &[u8]) -> Option<Vec<u8, MAX_FRAME_LEN>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return None;
    }

    let mut frame: Vec<u8, MAX_FRAME_LEN> = Vec::new();
    frame.extend_from_slice(&[SYNC, SYNC, payload.len() as u8]).ok()?;
    frame.extend_from_slice(payload).ok()?;
    frame.push(checksum(payload)).ok()?;
    Some(frame)
}

/// Payload carrying one raw ECG sample.
pub const fn raw_ecg_payload(sample: i16) -> [u8; 4] {
    let [hi, lo] = sample.to_be_bytes();
    [CODE_RAW_ECG, RAW_ECG_LEN, hi, lo]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty_payload() {
        assert_eq!(checksum(&[]), 0xFF);
    }

    #[test]
    fn test_checksum_wraps() {
        // 0x02 + 0xC8 = 0xCA, complement 0x35
        assert_eq!(checksum(&[0x02, 0xC8]), 0x35);
        // 0xFF + 0x02 = 0x101 -> 0x01, complement 0xFE
        assert_eq!(checksum(&[0xFF, 0x02]), 0xFE);
    }

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(&[CODE_SIGNAL_QUALITY, SENSOR_ON]).unwrap();
        assert_eq!(frame.as_slice(), &[0xAA, 0xAA, 0x02, 0x02, 0xC8, 0x35]);
    }

    #[test]
    fn test_encode_frame_max_payload() {
        let payload = [0x01u8; MAX_PAYLOAD_LEN];
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(frame.len(), MAX_FRAME_LEN);
        assert_eq!(frame[2], 0xFF);
    }

    #[test]
    fn test_encode_frame_rejects_oversized_payload() {
        let payload = [0u8; MAX_PAYLOAD_LEN + 1];
        assert!(encode_frame(&payload).is_none());
    }

    #[test]
    fn test_raw_ecg_payload_big_endian() {
        assert_eq!(raw_ecg_payload(0x1234), [0x80, 0x02, 0x12, 0x34]);
        assert_eq!(raw_ecg_payload(-2), [0x80, 0x02, 0xFF, 0xFE]);
    }
}
