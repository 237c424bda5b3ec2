//! Round-trips a manifest through the user's `$EDITOR`

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Editor used when neither `VISUAL` nor `EDITOR` is set
pub const DEFAULT_EDITOR: &str = "vi";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("editor exited with {0}")]
    Exited(ExitStatus),

    #[error("no editor configured")]
    NoEditor,
}

/// The editor command line from `VISUAL`, then `EDITOR`
pub fn editor_command() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .ok()
        .filter(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Opens `initial` in the configured editor. Returns `None` if unchanged.
pub fn edit(initial: &str) -> Result<Option<String>, EditorError> {
    edit_with(&editor_command(), initial)
}

/// Opens `initial` with `command` (program plus whitespace-separated args)
pub fn edit_with(command: &str, initial: &str) -> Result<Option<String>, EditorError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(EditorError::NoEditor)?;

    let mut file = tempfile::Builder::new()
        .prefix("kubegraf-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let status = Command::new(program).args(parts).arg(file.path()).status()?;
    if !status.success() {
        return Err(EditorError::Exited(status));
    }

    let edited = fs::read_to_string(file.path())?;
    if edited == initial || edited.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(edited))
    }
}
