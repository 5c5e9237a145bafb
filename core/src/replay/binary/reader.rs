//! Binary macro format reader
//!
//! Reads .gdr files of every supported format version.

use super::{
    CodecError, EventBits, FORMAT_VERSION, FormatFlags, MAGIC, MAX_STRING_LEN, MIN_FORMAT_VERSION,
};
use crate::replay::types::*;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

/// Cap on pre-allocation from an untrusted count
const MAX_PREALLOC: usize = 1 << 16;

/// Reader for binary macro format
pub struct BinaryReader<R: Read> {
    reader: R,
    version: u8,
}

impl<R: Read> BinaryReader<R> {
    /// Create a new binary reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            version: FORMAT_VERSION,
        }
    }

    /// Format version of the last macro read
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Read a complete macro from the input
    pub fn read_macro(&mut self) -> Result<Macro, CodecError> {
        let mut magic = [0u8; 4];
        self.reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(CodecError::BadMagic(magic));
        }

        let version = self.reader.read_u8()?;
        if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
            return Err(CodecError::UnsupportedVersion(version));
        }
        self.version = version;

        let flags = FormatFlags::from_bits_truncate(self.reader.read_u8()?);
        let mut reserved = [0u8; 2];
        self.reader.read_exact(&mut reserved)?;

        let frame_rate = self.reader.read_f64::<LittleEndian>()?;
        let duration = self.reader.read_f64::<LittleEndian>()?;
        let level_id = self.reader.read_i32::<LittleEndian>()?;

        let author = self.read_string()?;
        let description = self.read_string()?;
        let game_version = self.read_string()?;
        let bot_name = self.read_string()?;
        let bot_version = self.read_string()?;
        let level_name = self.read_string()?;

        let inputs = self.read_inputs()?;

        let position_fixes = if flags.contains(FormatFlags::HAS_POSITION_FIXES) {
            self.read_fixes()?
        } else {
            Vec::new()
        };

        Ok(Macro {
            author,
            description,
            game_version,
            frame_rate,
            duration,
            inputs,
            position_fixes,
            bot_info: BotInfo {
                name: bot_name,
                version: bot_version,
            },
            low_detail: flags.contains(FormatFlags::LOW_DETAIL),
            level: LevelInfo {
                id: level_id,
                name: level_name,
            },
        })
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.reader.read_u32::<LittleEndian>()?;
        if len > MAX_STRING_LEN {
            return Err(CodecError::StringTooLong(len as usize));
        }
        let mut bytes = vec![0u8; len as usize];
        self.reader.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }

    fn read_inputs(&mut self) -> Result<Vec<InputEvent>, CodecError> {
        let count = self.reader.read_u32::<LittleEndian>()? as usize;
        let mut inputs = Vec::with_capacity(count.min(MAX_PREALLOC));

        for _ in 0..count {
            let frame = self.reader.read_u64::<LittleEndian>()?;
            let button = self.reader.read_u8()?;
            let bits = EventBits::from_bits_truncate(self.reader.read_u8()?);

            inputs.push(InputEvent {
                frame,
                button,
                player2: bits.contains(EventBits::PLAYER2),
                hold: bits.contains(EventBits::HOLD),
            });
        }

        Ok(inputs)
    }

    fn read_fixes(&mut self) -> Result<Vec<PositionFix>, CodecError> {
        let count = self.reader.read_u32::<LittleEndian>()? as usize;
        let mut fixes = Vec::with_capacity(count.min(MAX_PREALLOC));

        for _ in 0..count {
            let frame = self.reader.read_u64::<LittleEndian>()?;
            let player1 = self.read_position()?;
            let player2 = self.read_position()?;
            fixes.push(PositionFix {
                frame,
                player1,
                player2,
            });
        }

        Ok(fixes)
    }

    fn read_position(&mut self) -> Result<PlayerPosition, CodecError> {
        let x = self.reader.read_f32::<LittleEndian>()?;
        let y = self.reader.read_f32::<LittleEndian>()?;

        if self.version < 2 {
            return Ok(PlayerPosition::at(x, y));
        }

        let rotation = self.reader.read_f32::<LittleEndian>()?;
        let flipped = self.reader.read_u8()? != 0;
        Ok(PlayerPosition {
            x,
            y,
            rotation,
            flipped,
        })
    }
}

/// Decode a macro from a byte slice
pub fn from_bytes(bytes: &[u8]) -> Result<Macro, CodecError> {
    BinaryReader::new(bytes).read_macro()
}
