//! Saving macros to disk
//!
//! Handles collision-free file naming, the save result codes, and
//! checkpoint-driven autosaves into `<save_dir>/autosaves/`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::host::GameHost;
use crate::replay::{BINARY_EXTENSION, CodecError, MacroFormat};
use crate::session::{CheckpointId, Session, SessionState};

/// Subdirectory of the host save directory holding autosaves
pub const AUTOSAVE_DIR: &str = "autosaves";

/// Result code of a successful save
pub const SAVE_OK: i32 = 0;

/// Save failure
///
/// Each variant maps to a stable numeric code, see [`SaveError::code`].
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("macro has no inputs")]
    EmptyMacro,

    #[error("path is not valid UTF-8: {}", .0.display())]
    PathEncodingFailure(PathBuf),

    #[error("cannot open {}: {source}", path.display())]
    FileOpenFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl SaveError {
    /// Stable result code (success is [`SAVE_OK`])
    pub fn code(&self) -> i32 {
        match self {
            SaveError::FileOpenFailure { .. } => 20,
            SaveError::WriteFailure { .. } => 21,
            SaveError::EmptyMacro => 30,
            SaveError::PathEncodingFailure(_) => 31,
        }
    }
}

/// Split a trailing `" (n)"` counter off a file stem
///
/// Returns the stem without the counter and the counter value. Names whose
/// parentheses hold anything but digits are not counters.
pub fn split_counter_suffix(name: &str) -> Option<(&str, u64)> {
    let inner = name.strip_suffix(')')?;
    let (stem, digits) = inner.rsplit_once(" (")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let counter = digits.parse().ok()?;
    Some((stem, counter))
}

/// First free path for `base` + `extension`
///
/// `base.ext` is used when free. Otherwise a `" (n)"` counter is appended,
/// continuing from any counter `base` already carries, so saving twice to
/// `P` yields `P (1)` then `P (2)`.
pub fn resolve_save_path(base: &str, extension: &str) -> PathBuf {
    let plain = PathBuf::from(format!("{base}{extension}"));
    if !plain.exists() {
        return plain;
    }

    let (stem, mut counter) = match split_counter_suffix(base) {
        Some((stem, n)) => (stem, n.saturating_add(1)),
        None => (base, 1),
    };

    loop {
        let candidate = PathBuf::from(format!("{stem} ({counter}){extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter = counter.saturating_add(1);
    }
}

/// Open for writing, creating missing parent directories on a second try
fn open_for_write(path: &Path) -> Result<File, SaveError> {
    match File::create(path) {
        Ok(file) => Ok(file),
        Err(first) => {
            debug!(path = %path.display(), "open failed ({first}), retrying");
            if let Some(parent) = path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    debug!(dir = %parent.display(), "cannot create parent directory: {e}");
                }
            }
            File::create(path).map_err(|source| SaveError::FileOpenFailure {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn write_all_to(mut file: File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()
}

/// Make a level name safe to embed in a single file name
///
/// Path separators, characters Windows rejects and control characters
/// become `_`, so the autosave always lands directly in its directory.
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

impl Session {
    /// Write the active macro next to `base_path`
    ///
    /// The format's extension is appended to `base_path`, with a counter
    /// suffix if that file already exists. Sets the author and description
    /// and recomputes the duration before writing. Returns the path written.
    pub fn save(
        &mut self,
        author: &str,
        description: &str,
        base_path: &Path,
        format: MacroFormat,
    ) -> Result<PathBuf, SaveError> {
        if self.active_macro().is_empty() {
            return Err(SaveError::EmptyMacro);
        }

        let base = base_path
            .to_str()
            .ok_or_else(|| SaveError::PathEncodingFailure(base_path.to_path_buf()))?;
        let path = resolve_save_path(base, format.extension());
        debug!(path = %path.display(), "saving macro");

        let m = self.active_macro_mut();
        m.author = author.to_string();
        m.description = description.to_string();
        m.update_duration();

        // A macro that cannot be encoded leaves no file behind
        let bytes = format
            .encode(self.active_macro())
            .map_err(|source| SaveError::WriteFailure {
                path: path.clone(),
                source,
            })?;

        let file = open_for_write(&path)?;
        write_all_to(file, &bytes).map_err(|e| SaveError::WriteFailure {
            path: path.clone(),
            source: CodecError::Io(e),
        })?;

        Ok(path)
    }

    /// Autosave when a checkpoint is reached during recording
    ///
    /// Only fires while recording with autosave enabled, for a known
    /// checkpoint at or past the last autosave. Failures are logged and
    /// never interrupt the recording.
    pub fn try_autosave(&mut self, host: &dyn GameHost, level_name: &str, checkpoint: CheckpointId) {
        if self.state() != SessionState::Recording {
            return;
        }
        if !self.config().autosave.enabled {
            return;
        }
        let Some(data) = self.checkpoint(checkpoint) else {
            return;
        };
        if data.frame < self.last_autosave() {
            return;
        }

        let dir = host.save_dir().join(AUTOSAVE_DIR);
        if let Err(e) = fs::create_dir_all(&dir) {
            debug!(dir = %dir.display(), "failed to create autosave directory: {e}");
            return;
        }

        let name = format!("autosave_{level_name}_{}", self.session_id());
        let base = dir.join(sanitize_file_component(&name));
        let mut stale = base.clone().into_os_string();
        stale.push(BINARY_EXTENSION);
        match fs::remove_file(&stale) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                debug!("failed to remove previous autosave: {e}");
            }
            _ => {}
        }

        let Some(username) = host.username() else {
            debug!("failed to autosave macro: no account");
            return;
        };

        match self.save(&username, "", &base, MacroFormat::Binary) {
            Ok(path) => {
                self.set_last_autosave(data.frame);
                debug!(path = %path.display(), frame = data.frame, "autosaved macro");
            }
            Err(e) => {
                debug!(code = e.code(), base = %base.display(), "failed to autosave macro: {e}");
            }
        }
    }
}
