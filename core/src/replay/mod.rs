//! Macro data model and file formats
//!
//! - **Binary format (`.gdr`)**: compact, versioned storage
//! - **JSON format (`.gdr.json`)**: same content, human-readable
//! - **Legacy text (`.txt`)**: one-way import of the old pipe-delimited format
//!
//! # Usage
//!
//! ```ignore
//! use macrobot_core::replay::{Macro, MacroFormat, load_macro_file};
//!
//! let m = load_macro_file(Path::new("level.gdr"))?;
//! let mut cursor = PlaybackCursor::new();
//!
//! // During game loop:
//! for event in cursor.poll(&m, frame) {
//!     // Press or release event.button
//! }
//! ```

pub mod binary;
pub mod json;
pub mod legacy;
pub mod playback;
pub mod types;

use std::path::Path;

pub use binary::{BinaryReader, BinaryWriter, CodecError};
pub use legacy::{LegacyError, LineError, import_legacy_file, parse_legacy, read_legacy_file};
pub use playback::{FrameEvents, PlaybackCursor};
pub use types::{
    BotInfo, DEFAULT_FRAME_RATE, InputEvent, LOAD_FAILURE_SENTINEL, LevelInfo, Macro,
    PlayerPosition, PositionFix, UNKNOWN_AUTHOR,
};

/// Binary file extension
pub const BINARY_EXTENSION: &str = ".gdr";

/// JSON file extension
pub const JSON_EXTENSION: &str = ".gdr.json";

/// On-disk encoding of a macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroFormat {
    #[default]
    Binary,
    Json,
}

impl MacroFormat {
    /// File extension including the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            MacroFormat::Binary => BINARY_EXTENSION,
            MacroFormat::Json => JSON_EXTENSION,
        }
    }

    /// Encode a macro in this format
    pub fn encode(self, m: &Macro) -> Result<Vec<u8>, CodecError> {
        match self {
            MacroFormat::Binary => binary::to_bytes(m),
            MacroFormat::Json => json::to_json_bytes(m),
        }
    }
}

/// Decode a macro, detecting the format from the leading magic bytes
pub fn decode_macro(bytes: &[u8]) -> Result<Macro, CodecError> {
    if bytes.starts_with(&binary::MAGIC) {
        binary::from_bytes(bytes)
    } else {
        json::from_json_slice(bytes)
    }
}

/// Read a `.gdr` or `.gdr.json` file
pub fn load_macro_file(path: &Path) -> Result<Macro, CodecError> {
    let bytes = std::fs::read(path)?;
    decode_macro(&bytes)
}
