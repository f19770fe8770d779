//! BMD101 frame parser.
//!
//! Consumes the UART stream one byte at a time and recognises
//! `SYNC SYNC LEN PAYLOAD CHECKSUM` frames. Every transition returns the next
//! [`ParserState`]; a completed or rejected frame always lands back in
//! [`ParserState::AwaitSync1`].

use heapless::Vec;

use crate::protocol::{MAX_PAYLOAD_LEN, SYNC};

/// Frame recognition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Looking for the first sync byte.
    AwaitSync1,
    /// First sync seen, expecting the second.
    AwaitSync2,
    /// Next byte is the payload length.
    ReadLength,
    /// Accumulating `remaining` more payload bytes.
    ReadPayload { remaining: u8 },
    /// Next byte is the checksum.
    ReadChecksum,
}

/// One checksum-validated protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    checksum: u8,
}

impl Frame {
    /// Payload bytes (0 to 255).
    #[inline]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Checksum computed over the payload (equal to the received one).
    #[inline]
    pub const fn checksum(&self) -> u8 { self.checksum }
}

/// Outcome of feeding one byte to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// Byte consumed, no frame boundary reached.
    Pending,
    /// A complete frame with a matching checksum.
    Frame(Frame),
    /// A complete frame whose checksum did not match; it is discarded.
    ChecksumMismatch { computed: u8, received: u8 },
}

/// Byte-at-a-time frame recogniser.
pub struct FrameParser {
    state: ParserState,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    sum: u8,
}

impl FrameParser {
    /// Create a parser waiting for the first sync byte.
    pub const fn new() -> Self {
        Self {
            state: ParserState::AwaitSync1,
            payload: Vec::new(),
            sum: 0,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> ParserState { self.state }

    /// Advance the state machine by one byte.
    pub fn push(
        &mut self,
        byte: u8,
    ) -> ParseEvent {
        let (next, event) = match self.state {
            ParserState::AwaitSync1 if byte == SYNC => (ParserState::AwaitSync2, ParseEvent::Pending),
            ParserState::AwaitSync1 => (ParserState::AwaitSync1, ParseEvent::Pending),
            ParserState::AwaitSync2 if byte == SYNC => (ParserState::ReadLength, ParseEvent::Pending),
            ParserState::AwaitSync2 => (ParserState::AwaitSync1, ParseEvent::Pending),
            ParserState::ReadLength => (self.begin_payload(byte), ParseEvent::Pending),
            ParserState::ReadPayload { remaining } => (self.accumulate(byte, remaining), ParseEvent::Pending),
            ParserState::ReadChecksum => (ParserState::AwaitSync1, self.finish(byte)),
        };
        self.state = next;
        event
    }

    fn begin_payload(
        &mut self,
        len: u8,
    ) -> ParserState {
        self.payload.clear();
        self.sum = 0;
        if len == 0 {
            ParserState::ReadChecksum
        } else {
            ParserState::ReadPayload { remaining: len }
        }
    }

    fn accumulate(
        &mut self,
        byte: u8,
        remaining: u8,
    ) -> ParserState {
        // Capacity equals the largest declarable length, so this cannot overflow
        let _ = self.payload.push(byte);
        self.sum = self.sum.wrapping_add(byte);
        match remaining - 1 {
            0 => ParserState::ReadChecksum,
            remaining => ParserState::ReadPayload { remaining },
        }
    }

    fn finish(
        &mut self,
        received: u8,
    ) -> ParseEvent {
        let computed = !self.sum;
        let payload = core::mem::take(&mut self.payload);
        if computed == received {
            ParseEvent::Frame(Frame {
                payload,
                checksum: computed,
            })
        } else {
            ParseEvent::ChecksumMismatch { computed, received }
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    fn feed(
        parser: &mut FrameParser,
        bytes: &[u8],
    ) -> std::vec::Vec<ParseEvent> {
        bytes
            .iter()
            .map(|&b| parser.push(b))
            .filter(|e| *e != ParseEvent::Pending)
            .collect()
    }

    fn frames(events: &[ParseEvent]) -> std::vec::Vec<std::vec::Vec<u8>> {
        events
            .iter()
            .filter_map(|e| match e {
                ParseEvent::Frame(f) => Some(f.payload().to_vec()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_state_progression() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.state(), ParserState::AwaitSync1);
        parser.push(0xAA);
        assert_eq!(parser.state(), ParserState::AwaitSync2);
        parser.push(0xAA);
        assert_eq!(parser.state(), ParserState::ReadLength);
        parser.push(2);
        assert_eq!(parser.state(), ParserState::ReadPayload { remaining: 2 });
        parser.push(0x02);
        assert_eq!(parser.state(), ParserState::ReadPayload { remaining: 1 });
        parser.push(0xC8);
        assert_eq!(parser.state(), ParserState::ReadChecksum);
        let event = parser.push(0x35);
        assert_eq!(parser.state(), ParserState::AwaitSync1);
        match event {
            ParseEvent::Frame(frame) => {
                assert_eq!(frame.payload(), &[0x02, 0xC8]);
                assert_eq!(frame.checksum(), 0x35);
            }
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_all_lengths() {
        let mut parser = FrameParser::new();
        for len in 0..=MAX_PAYLOAD_LEN {
            let payload: std::vec::Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let frame = encode_frame(&payload).unwrap();
            let events = feed(&mut parser, &frame);
            assert_eq!(frames(&events), vec![payload], "length {len}");
        }
    }

    #[test]
    fn test_single_bit_flips_discard_frame() {
        let payload = [0x02, 0xC8, 0x03, 0x48, 0x80, 0x02, 0x01, 0xF4];
        let frame = encode_frame(&payload).unwrap();

        // Flip every bit of the payload and the checksum byte
        for idx in 3..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[idx] ^= 1 << bit;
                let mut parser = FrameParser::new();
                let events = feed(&mut parser, &corrupted);
                assert!(frames(&events).is_empty(), "byte {idx} bit {bit}");
                assert!(matches!(events[..], [ParseEvent::ChecksumMismatch { .. }]));
                assert_eq!(parser.state(), ParserState::AwaitSync1);
            }
        }
    }

    #[test]
    fn test_zero_length_frame() {
        let mut parser = FrameParser::new();
        let events = feed(&mut parser, &[0xAA, 0xAA, 0x00, 0xFF]);
        assert_eq!(frames(&events), vec![std::vec::Vec::<u8>::new()]);
    }

    #[test]
    fn test_garbage_before_sync_is_skipped() {
        let mut parser = FrameParser::new();
        let mut stream = vec![0x00, 0x13, 0xAA, 0x42, 0x55];
        stream.extend_from_slice(&encode_frame(&[0x03, 0x48]).unwrap());
        let events = feed(&mut parser, &stream);
        assert_eq!(frames(&events), vec![vec![0x03, 0x48]]);
    }

    #[test]
    fn test_lone_sync_falls_back() {
        let mut parser = FrameParser::new();
        parser.push(0xAA);
        parser.push(0x01);
        assert_eq!(parser.state(), ParserState::AwaitSync1);
    }

    #[test]
    fn test_mismatch_reports_both_checksums() {
        let mut parser = FrameParser::new();
        let events = feed(&mut parser, &[0xAA, 0xAA, 0x02, 0x02, 0xC8, 0x00]);
        assert_eq!(
            events,
            vec![ParseEvent::ChecksumMismatch {
                computed: 0x35,
                received: 0x00,
            }]
        );
    }

    #[test]
    fn test_recovers_after_mismatch() {
        let mut parser = FrameParser::new();
        let mut stream = vec![0xAA, 0xAA, 0x01, 0x10, 0x00];
        stream.extend_from_slice(&encode_frame(&[0x02, 0x00]).unwrap());
        let events = feed(&mut parser, &stream);
        assert_eq!(events.len(), 2);
        assert_eq!(frames(&events), vec![vec![0x02, 0x00]]);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut parser = FrameParser::new();
        let mut stream = std::vec::Vec::new();
        for value in [0u8, 200, 200] {
            stream.extend_from_slice(&encode_frame(&[0x02, value]).unwrap());
        }
        let events = feed(&mut parser, &stream);
        assert_eq!(frames(&events).len(), 3);
    }
}
