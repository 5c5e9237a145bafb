//! Legacy text macro import
//!
//! One-way migration from the old pipe-delimited format:
//!
//! ```text
//! 60                              frame-rate hint (or "android" for x4)
//! frame|hold|button|player2|posOnly[|p1x|p1y|...|p2x|p2y|...]
//! ```
//!
//! Frames are scaled to the 240 fps physics clock and rounded. Rows with
//! `posOnly` set become position fixes (player 1 from fields 5/6, player 2
//! from fields 11/12) instead of input events.

use crate::replay::types::*;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Frame-rate hint that implies a fixed multiplier
pub const ANDROID_TAG: &str = "android";

/// Multiplier implied by [`ANDROID_TAG`]
pub const ANDROID_MULTIPLIER: f64 = 4.0;

/// Fields every data row needs
const MIN_ROW_FIELDS: usize = 5;

/// Fields a position-only row needs (player 2 y is field 12)
const MIN_FIX_FIELDS: usize = 13;

/// Why a single line was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("field {index} is not a valid number: {value:?}")]
    InvalidNumber { index: usize, value: String },

    #[error("invalid frame-rate hint {0:?}")]
    InvalidFrameRate(String),

    #[error("frame {0} is negative")]
    NegativeFrame(i64),
}

/// Legacy import failure
#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{count} malformed line(s); line {first_line}: {first_error}")]
    MalformedLines {
        first_line: usize,
        count: usize,
        first_error: LineError,
    },
}

/// One parsed data row
enum Row {
    Input(InputEvent),
    Fix(PositionFix),
}

/// Parse legacy text into a macro
///
/// Every line is checked; if any line is malformed the whole import fails
/// and the error reports how many lines were rejected.
pub fn parse_legacy(text: &str, game_version: &str) -> Result<Macro, LegacyError> {
    let mut m = Macro {
        author: UNKNOWN_AUTHOR.to_string(),
        description: UNKNOWN_AUTHOR.to_string(),
        game_version: game_version.to_string(),
        ..Macro::default()
    };

    let mut multiplier = 1.0f64;
    let mut seen_data = false;
    let mut errors: Vec<(usize, LineError)> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() > 1 && fields.last() == Some(&"") {
            fields.pop();
        }

        if fields.len() < 4 && !seen_data {
            match parse_frame_rate_hint(fields[0]) {
                Ok(value) => multiplier = value,
                Err(e) => errors.push((line_no, e)),
            }
            continue;
        }

        seen_data = true;
        match parse_row(&fields, multiplier) {
            Ok(Row::Input(event)) => m.push_input(event),
            Ok(Row::Fix(fix)) => m.push_fix(fix),
            Err(e) => errors.push((line_no, e)),
        }
    }

    if let Some((first_line, first_error)) = errors.first().cloned() {
        return Err(LegacyError::MalformedLines {
            first_line,
            count: errors.len(),
            first_error,
        });
    }

    Ok(m)
}

/// Read and parse a legacy file
pub fn read_legacy_file(path: &Path, game_version: &str) -> Result<Macro, LegacyError> {
    let text = std::fs::read_to_string(path).map_err(|source| LegacyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_legacy(&text, game_version)
}

/// Import a legacy file, returning [`Macro::load_failure`] on any error
///
/// Callers must check [`Macro::is_load_failure`] before accepting the result.
pub fn import_legacy_file(path: &Path, game_version: &str) -> Macro {
    match read_legacy_file(path, game_version) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(path = %path.display(), "legacy import failed: {e}");
            Macro::load_failure()
        }
    }
}

fn parse_frame_rate_hint(field: &str) -> Result<f64, LineError> {
    if field.eq_ignore_ascii_case(ANDROID_TAG) {
        return Ok(ANDROID_MULTIPLIER);
    }

    match field.parse::<u32>() {
        Ok(fps) if fps > 0 => Ok(DEFAULT_FRAME_RATE / fps as f64),
        _ => Err(LineError::InvalidFrameRate(field.to_string())),
    }
}

fn parse_row(fields: &[&str], multiplier: f64) -> Result<Row, LineError> {
    if fields.len() < MIN_ROW_FIELDS {
        return Err(LineError::TooFewFields {
            expected: MIN_ROW_FIELDS,
            found: fields.len(),
        });
    }

    let raw_frame: i64 = parse_field(fields, 0)?;
    let scaled = (raw_frame as f64 * multiplier).round();
    if scaled < 0.0 {
        return Err(LineError::NegativeFrame(raw_frame));
    }
    let frame = scaled as u64;

    let hold = fields[1] == "1";
    let player2 = fields[3] == "1";
    let pos_only = fields[4] == "1";

    if pos_only {
        if fields.len() < MIN_FIX_FIELDS {
            return Err(LineError::TooFewFields {
                expected: MIN_FIX_FIELDS,
                found: fields.len(),
            });
        }

        return Ok(Row::Fix(PositionFix {
            frame,
            player1: PlayerPosition::at(parse_field(fields, 5)?, parse_field(fields, 6)?),
            player2: PlayerPosition::at(parse_field(fields, 11)?, parse_field(fields, 12)?),
        }));
    }

    let button: u8 = parse_field(fields, 2)?;
    Ok(Row::Input(InputEvent::new(frame, button, player2, hold)))
}

fn parse_field<T: FromStr>(fields: &[&str], index: usize) -> Result<T, LineError> {
    fields[index]
        .parse()
        .map_err(|_| LineError::InvalidNumber {
            index,
            value: fields[index].to_string(),
        })
}
