use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::Quiz;
use crate::parser::{parse_quiz_text, FormatError};

/// Error reading a quiz document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid quiz format in {}: {source}", .path.display())]
    Format { path: PathBuf, source: FormatError },

    #[error("invalid quiz document in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load a quiz, choosing the reader by extension: `.json` files hold a
/// quiz document, anything else is plain quiz text.
pub fn load_quiz<P: AsRef<Path>>(path: P) -> Result<Quiz, LoadError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        load_quiz_json(path)
    } else {
        load_quiz_text(path)
    }
}

pub fn load_quiz_text<P: AsRef<Path>>(path: P) -> Result<Quiz, LoadError> {
    let path = path.as_ref();
    let text = read(path)?;
    parse_quiz_text(&text).map_err(|source| LoadError::Format {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_quiz_json<P: AsRef<Path>>(path: P) -> Result<Quiz, LoadError> {
    let path = path.as_ref();
    let json = read(path)?;
    serde_json::from_str(&json).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
