//! Binary macro format writer

use super::{CodecError, EventBits, FORMAT_VERSION, FormatFlags, MAGIC, MAX_STRING_LEN};
use crate::replay::types::*;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Writer for binary macro format
pub struct BinaryWriter<W: Write> {
    writer: W,
    version: u8,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer emitting the current format version
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            version: FORMAT_VERSION,
        }
    }

    /// Emit an older format version (v1 drops rotation and flip from fixes)
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Write a complete macro to the output
    pub fn write_macro(&mut self, m: &Macro) -> Result<(), CodecError> {
        let mut flags = FormatFlags::empty();
        if m.low_detail {
            flags |= FormatFlags::LOW_DETAIL;
        }
        if !m.position_fixes.is_empty() {
            flags |= FormatFlags::HAS_POSITION_FIXES;
        }

        self.write_header(m, flags)?;

        self.write_string(&m.author)?;
        self.write_string(&m.description)?;
        self.write_string(&m.game_version)?;
        self.write_string(&m.bot_info.name)?;
        self.write_string(&m.bot_info.version)?;
        self.write_string(&m.level.name)?;

        self.write_inputs(&m.inputs)?;

        if flags.contains(FormatFlags::HAS_POSITION_FIXES) {
            self.write_fixes(&m.position_fixes)?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Write the 28-byte header
    fn write_header(&mut self, m: &Macro, flags: FormatFlags) -> Result<(), CodecError> {
        self.writer.write_all(&MAGIC)?;
        self.writer.write_u8(self.version)?;
        self.writer.write_u8(flags.bits())?;
        self.writer.write_all(&[0u8; 2])?; // reserved
        self.writer.write_f64::<LittleEndian>(m.frame_rate)?;
        self.writer.write_f64::<LittleEndian>(m.duration)?;
        self.writer.write_i32::<LittleEndian>(m.level.id)?;
        Ok(())
    }

    /// Strings the reader would reject are refused here
    fn write_string(&mut self, s: &str) -> Result<(), CodecError> {
        let len = u32::try_from(s.len())
            .ok()
            .filter(|&len| len <= MAX_STRING_LEN)
            .ok_or(CodecError::StringTooLong(s.len()))?;
        self.writer.write_u32::<LittleEndian>(len)?;
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn write_inputs(&mut self, inputs: &[InputEvent]) -> Result<(), CodecError> {
        self.writer.write_u32::<LittleEndian>(inputs.len() as u32)?;

        for input in inputs {
            let mut bits = EventBits::empty();
            bits.set(EventBits::PLAYER2, input.player2);
            bits.set(EventBits::HOLD, input.hold);

            self.writer.write_u64::<LittleEndian>(input.frame)?;
            self.writer.write_u8(input.button)?;
            self.writer.write_u8(bits.bits())?;
        }

        Ok(())
    }

    fn write_fixes(&mut self, fixes: &[PositionFix]) -> Result<(), CodecError> {
        self.writer.write_u32::<LittleEndian>(fixes.len() as u32)?;

        for fix in fixes {
            self.writer.write_u64::<LittleEndian>(fix.frame)?;
            self.write_position(&fix.player1)?;
            self.write_position(&fix.player2)?;
        }

        Ok(())
    }

    fn write_position(&mut self, pos: &PlayerPosition) -> Result<(), CodecError> {
        self.writer.write_f32::<LittleEndian>(pos.x)?;
        self.writer.write_f32::<LittleEndian>(pos.y)?;
        if self.version >= 2 {
            self.writer.write_f32::<LittleEndian>(pos.rotation)?;
            self.writer.write_u8(pos.flipped as u8)?;
        }
        Ok(())
    }
}

/// Encode a macro into a byte vector
pub fn to_bytes(m: &Macro) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    BinaryWriter::new(&mut buffer).write_macro(m)?;
    Ok(buffer)
}
