//! Binary macro format (.gdr)
//!
//! Little-endian, length-prefixed layout. Position fixes are versioned:
//! version 1 stores only coordinates, version 2 adds rotation and flip.
//!
//! # File Structure
//!
//! ```text
//! Header (28 bytes)
//!   magic: [u8; 4] = "GDRM"
//!   version: u8
//!   flags: u8
//!   reserved: [u8; 2]
//!   frame_rate: f64
//!   duration: f64
//!   level_id: i32
//! Metadata
//!   author, description, game_version, bot_name, bot_version, level_name
//!   (each u32 length + UTF-8 bytes)
//! Inputs
//!   count: u32
//!   count x { frame: u64, button: u8, bits: u8 }
//! Position fixes (if flagged)
//!   count: u32
//!   count x { frame: u64, player1, player2 }
//!   player = { x: f32, y: f32 } (v1) | { x: f32, y: f32, rotation: f32, flipped: u8 } (v2)
//! ```

mod reader;
mod writer;

pub use reader::{BinaryReader, from_bytes};
pub use writer::{BinaryWriter, to_bytes};

use std::io;

/// File magic
pub const MAGIC: [u8; 4] = *b"GDRM";

/// Version written by [`BinaryWriter`] by default
pub const FORMAT_VERSION: u8 = 2;

/// Oldest version [`BinaryReader`] accepts
pub const MIN_FORMAT_VERSION: u8 = 1;

/// Upper bound for a single metadata string
pub const MAX_STRING_LEN: u32 = 1 << 20;

bitflags::bitflags! {
    /// Header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u8 {
        /// Recorded in low-detail mode
        const LOW_DETAIL = 0b0000_0001;
        /// Position fix section follows the inputs
        const HAS_POSITION_FIXES = 0b0000_0010;
    }
}

bitflags::bitflags! {
    /// Per-event bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct EventBits: u8 {
        const PLAYER2 = 0b01;
        const HOLD = 0b10;
    }
}

/// Errors from encoding or decoding a macro
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a macro file (magic {0:02x?})")]
    BadMagic([u8; 4]),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("metadata string of {0} bytes exceeds the limit")]
    StringTooLong(usize),

    #[error("metadata string is not valid UTF-8")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
