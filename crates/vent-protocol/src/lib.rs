//! Hamilton Ventilator Protocol Library
//!
//! This crate provides framing, validation and decoding for the serial
//! data protocol spoken by Hamilton ventilators in mixed mode:
//!
//! - A streaming frame codec that reassembles delimited frames from an
//!   arbitrarily chunked byte stream
//! - Frame validation against the trailing CRC-8 checksum
//! - Decoding of parameter chunks into named (group, parameter, value)
//!   readings via static lookup tables
//! - Encoding of the outbound activation command that puts the ventilator
//!   into mixed mode
//!
//! # Frame Format
//! ```text
//! STX [opcode] [payload...] ETX [crc hex(2)] CR
//! ```
//!
//! - `STX` (0x02): Frame start
//! - `opcode`: Command class this frame belongs to (0x31 for mixed mode)
//! - `payload`: VT-separated parameter chunks
//! - `ETX` (0x03): End of data
//! - `crc hex`: CRC-8 (polynomial 0xD5) over STX..ETX inclusive, rendered
//!   as two uppercase hex ASCII characters
//! - `CR` (0x0D): Frame terminator
//!
//! # Example
//!
//! ```rust
//! use vent_protocol::{decode_parameters, validate_frame, FrameCodec};
//!
//! let mut codec = FrameCodec::new();
//! codec.push_bytes(&[0x02, 0x31, 0x0B, 0x50, 0x20, 0x35, 0x03, b'A', b'6', 0x0D]);
//!
//! let frame = codec.next_frame().unwrap();
//! let payload = validate_frame(&frame).unwrap();
//! let readings = decode_parameters(payload).unwrap();
//! assert_eq!(readings[0].parameter, "Breath Number");
//! assert_eq!(readings[0].value, "5");
//! ```

pub mod checksum;
pub mod command;
pub mod error;
pub mod frame;
pub mod params;

pub use checksum::crc8;
pub use command::{build_activation_command, SendMode};
pub use error::FrameError;
pub use frame::{encode_frame, validate_frame, FrameCodec};
pub use params::{decode_parameters, group_name, parameter_name, Reading};

/// Frame start byte
pub const STX: u8 = 0x02;
/// End-of-data byte, separates payload from the checksum trailer
pub const ETX: u8 = 0x03;
/// Frame terminator byte
pub const CR: u8 = 0x0D;
/// Separator between parameter chunks within a payload
pub const VT: u8 = 0x0B;

/// Opcode of the mixed-mode activation command; replies carry it back
pub const CMD_ACTIVATE_MIXED_MODE: u8 = 0x31;
