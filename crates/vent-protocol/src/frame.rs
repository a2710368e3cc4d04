//! Frame extraction, validation and encoding
//!
//! The ventilator sends frames as `STX .. CR` byte runs over a serial line
//! that delivers data in arbitrary chunks. [`FrameCodec`] reassembles
//! complete candidate frames from that stream; [`validate_frame`] checks a
//! candidate's structure and checksum and exposes its payload;
//! [`encode_frame`] seals an outbound frame body with the same envelope.

use crate::checksum::crc8;
use crate::error::FrameError;
use crate::{CR, ETX, STX};

/// Generous upper bound on a single frame; the buffer is trimmed past this
const MAX_FRAME_LEN: usize = 1024;

/// Streaming frame codec
///
/// Accumulates raw serial bytes and yields complete `STX..CR` candidate
/// frames. Bytes before a frame start are line noise and silently dropped;
/// a frame whose terminator has not yet arrived stays buffered until more
/// data is pushed.
pub struct FrameCodec {
    buffer: Vec<u8>,
}

impl FrameCodec {
    /// Create a new codec with an empty buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(256),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent unbounded growth when the stream never frames
        if self.buffer.len() > MAX_FRAME_LEN * 4 {
            let start = self.buffer.len() - MAX_FRAME_LEN;
            tracing::warn!("frame buffer overflow, dropping {} bytes", start);
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Try to extract the next complete frame from the buffer
    ///
    /// Returns the bytes from STX through CR inclusive, removing them from
    /// the buffer. Returns `None` when no complete frame is available yet;
    /// callers should push more bytes and retry. Calling repeatedly drains
    /// queued frames one at a time, each byte belonging to at most one
    /// emitted frame.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let stx_pos = self.buffer.iter().position(|&b| b == STX)?;

        // Discard noise bytes before the frame start
        if stx_pos > 0 {
            tracing::debug!("dropping {} noise bytes before frame start", stx_pos);
            self.buffer.drain(..stx_pos);
        }

        let cr_pos = self.buffer.iter().position(|&b| b == CR)?;

        Some(self.buffer.drain(..=cr_pos).collect())
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a candidate frame and return its payload.
///
/// Locates the ETX marker, parses the two trailer bytes as hex, and
/// compares them against the CRC-8 recomputed over STX..ETX inclusive.
/// `expected` in the mismatch error is the recomputed value, `actual` the
/// value the frame carried. On success, returns the bytes strictly between
/// STX and ETX (opcode plus parameter section).
pub fn validate_frame(frame: &[u8]) -> Result<&[u8], FrameError> {
    let etx_pos = frame
        .iter()
        .position(|&b| b == ETX)
        .ok_or(FrameError::MissingEtx)?;

    // Need 2 checksum chars + CR after the ETX
    if etx_pos + 3 >= frame.len() {
        return Err(FrameError::TruncatedTrailer);
    }

    let checksum_text: [u8; 2] = [frame[etx_pos + 1], frame[etx_pos + 2]];
    let received = std::str::from_utf8(&checksum_text)
        .ok()
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or(FrameError::InvalidChecksumText(checksum_text))?;

    let computed = crc8(&frame[..=etx_pos]);
    if computed != received {
        return Err(FrameError::ChecksumMismatch {
            expected: computed,
            actual: received,
        });
    }

    Ok(&frame[1..etx_pos])
}

/// Seal an outbound frame body with the protocol envelope.
///
/// `body` is the opcode followed by the payload. The result is
/// `STX body ETX <crc hex> CR`, with the checksum computed over
/// STX..ETX inclusive and rendered as two uppercase hex characters.
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 5);
    frame.push(STX);
    frame.extend_from_slice(body);
    frame.push(ETX);

    let checksum = crc8(&frame);
    frame.extend_from_slice(format!("{:02X}", checksum).as_bytes());
    frame.push(CR);
    frame
}

#[cfg(test)]
mod tests {
    use super::{encode_frame, validate_frame, FrameCodec};
    use crate::error::FrameError;

    /// Breath Number = "5" in Monitored Parameters, pre-sealed
    const BREATH_FRAME: &[u8] = &[
        0x02, 0x31, 0x0B, 0x50, 0x20, 0x35, 0x03, b'A', b'6', 0x0D,
    ];

    #[test]
    fn test_extract_single_frame() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(BREATH_FRAME);

        assert_eq!(codec.next_frame().unwrap(), BREATH_FRAME);
        assert!(codec.next_frame().is_none());
    }

    #[test]
    fn test_partial_frame_waits_for_terminator() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&BREATH_FRAME[..4]);
        assert!(codec.next_frame().is_none());

        codec.push_bytes(&BREATH_FRAME[4..]);
        assert_eq!(codec.next_frame().unwrap(), BREATH_FRAME);
    }

    #[test]
    fn test_noise_before_frame_is_dropped() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&[0xAA, 0x55, 0x00]);
        codec.push_bytes(BREATH_FRAME);

        assert_eq!(codec.next_frame().unwrap(), BREATH_FRAME);
    }

    #[test]
    fn test_queued_frames_drain_in_order() {
        let first = encode_frame(&[0x31, 0x0B, 0x50, 0x20, b'1']);
        let second = encode_frame(&[0x31, 0x0B, 0x50, 0x20, b'2']);

        let mut codec = FrameCodec::new();
        codec.push_bytes(&first);
        codec.push_bytes(&second);

        assert_eq!(codec.next_frame().unwrap(), first);
        assert_eq!(codec.next_frame().unwrap(), second);
        assert!(codec.next_frame().is_none());
    }

    #[test]
    fn test_validate_accepts_good_frame() {
        let payload = validate_frame(BREATH_FRAME).unwrap();
        assert_eq!(payload, &[0x31, 0x0B, 0x50, 0x20, 0x35]);
    }

    #[test]
    fn test_validate_rejects_missing_etx() {
        // STX, opcode, then straight to a fake trailer and CR
        let frame = [0x02, 0x31, b'0', b'0', 0x0D];
        assert_eq!(validate_frame(&frame), Err(FrameError::MissingEtx));
    }

    #[test]
    fn test_validate_rejects_truncated_trailer() {
        // ETX with only one checksum character before CR
        let frame = [0x02, 0x31, 0x03, b'7', 0x0D];
        assert_eq!(validate_frame(&frame), Err(FrameError::TruncatedTrailer));
    }

    #[test]
    fn test_validate_rejects_bad_hex() {
        let frame = [0x02, 0x31, 0x03, b'Z', b'Z', 0x0D];
        assert_eq!(
            validate_frame(&frame),
            Err(FrameError::InvalidChecksumText([b'Z', b'Z']))
        );
    }

    #[test]
    fn test_validate_rejects_corrupted_frame() {
        let mut corrupted = BREATH_FRAME.to_vec();
        corrupted[4] ^= 0x01; // flip one bit inside the checksum input

        assert!(matches!(
            validate_frame(&corrupted),
            Err(FrameError::ChecksumMismatch { .. })
        ));
        // The pristine copy still validates
        assert!(validate_frame(BREATH_FRAME).is_ok());
    }

    #[test]
    fn test_encode_then_validate() {
        let body = [0x31, 0x0B, 0x50, 0x21, b'2', b'5'];
        let frame = encode_frame(&body);

        assert_eq!(validate_frame(&frame).unwrap(), &body);
    }

    mod stream_splitting {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Feeding N frames across arbitrary split points yields exactly
            /// N frames, byte-identical and in order.
            #[test]
            fn frames_survive_arbitrary_chunking(
                values in proptest::collection::vec(0u32..10_000, 1..8),
                chunk_len in 1usize..16,
            ) {
                let frames: Vec<Vec<u8>> = values
                    .iter()
                    .map(|v| {
                        let mut body = vec![0x31, 0x0B, 0x50, 0x20];
                        body.extend_from_slice(v.to_string().as_bytes());
                        encode_frame(&body)
                    })
                    .collect();

                let stream: Vec<u8> = frames.iter().flatten().copied().collect();

                let mut codec = FrameCodec::new();
                let mut extracted = Vec::new();
                for chunk in stream.chunks(chunk_len) {
                    codec.push_bytes(chunk);
                    while let Some(frame) = codec.next_frame() {
                        extracted.push(frame);
                    }
                }

                prop_assert_eq!(extracted, frames);
            }
        }
    }
}
