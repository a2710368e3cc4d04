//! Error types for frame validation

use thiserror::Error;

/// Errors produced while validating a candidate frame.
///
/// An incomplete frame is not an error: the codec simply returns `None`
/// until the terminator arrives. These variants all describe frames that
/// were fully delimited but structurally or arithmetically wrong; callers
/// discard the frame and keep consuming the stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No ETX marker anywhere in the frame
    #[error("missing end-of-data marker")]
    MissingEtx,

    /// ETX found, but fewer than 3 bytes (checksum pair + CR) follow it
    #[error("truncated checksum trailer after end-of-data marker")]
    TruncatedTrailer,

    /// The two trailer bytes are not valid hexadecimal
    #[error("checksum text is not valid hex: {0:02X?}")]
    InvalidChecksumText([u8; 2]),

    /// Recomputed checksum does not match the trailer
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}
