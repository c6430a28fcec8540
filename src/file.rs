use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// A file selected for listing, before its content is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Absolute path to the file
    pub absolute_path: PathBuf,

    /// Path relative to the project root, with `/` separators
    pub relative_path: String,
}

impl FileCandidate {
    /// Creates a new candidate.
    #[must_use]
    pub fn new(absolute_path: impl Into<PathBuf>, relative_path: impl Into<String>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Returns the file name component of the relative path.
    #[must_use]
    pub fn name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// A source file whose content has been read and sanitized.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    /// Absolute path to the file
    pub absolute_path: PathBuf,

    /// Path relative to the project root, with `/` separators
    pub relative_path: String,

    /// Sanitized text content
    pub content: String,

    /// Length of `content` in characters
    pub char_count: usize,
}

impl ProjectFile {
    /// Creates a project file from raw text, sanitizing it first.
    #[must_use]
    pub fn new(
        absolute_path: impl Into<PathBuf>,
        relative_path: impl Into<String>,
        content: &str,
    ) -> Self {
        let content = sanitize(content);
        let char_count = content.chars().count();

        Self {
            absolute_path: absolute_path.into(),
            relative_path: relative_path.into(),
            content,
            char_count,
        }
    }

    /// Splits the content into listing lines.
    ///
    /// See [`split_lines`] for the handling of the trailing line.
    #[must_use]
    pub fn lines(&self, keep_trailing_empty_line: bool) -> Vec<&str> {
        split_lines(&self.content, keep_trailing_empty_line)
    }
}

/// Result of trying to read a selected file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// The file was read and can be listed
    Loaded(ProjectFile),

    /// The file could not be read and is left out
    Skipped {
        /// Relative path of the skipped file
        relative_path: String,
        /// Why it was skipped
        reason: String,
    },
}

impl FileOutcome {
    /// Returns true if the file was read.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Reads a candidate, classifying failures instead of propagating them.
#[must_use]
pub fn read_project_file(candidate: &FileCandidate) -> FileOutcome {
    match read_text(&candidate.absolute_path) {
        Ok(text) => {
            trace!("Read {} ({} bytes)", candidate.relative_path, text.len());
            FileOutcome::Loaded(ProjectFile::new(
                candidate.absolute_path.clone(),
                candidate.relative_path.clone(),
                &text,
            ))
        }
        Err(e) => {
            warn!("Skipping unreadable file {}: {}", candidate.relative_path, e);
            FileOutcome::Skipped {
                relative_path: candidate.relative_path.clone(),
                reason: e.to_string(),
            }
        }
    }
}

/// Reads a file as UTF-8, dropping invalid byte sequences.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(decode_lossy(&bytes))
}

/// Decodes UTF-8, skipping invalid bytes rather than replacing them.
#[must_use]
pub(crate) fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Returns true for characters a WordprocessingML document can carry.
#[must_use]
pub const fn is_document_safe(ch: char) -> bool {
    matches!(
        ch as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x1_0000..=0x10_FFFF
    )
}

/// Drops characters outside the document-safe ranges.
#[must_use]
pub fn sanitize(text: &str) -> String {
    if text.chars().all(is_document_safe) {
        return text.to_string();
    }
    text.chars().filter(|&ch| is_document_safe(ch)).collect()
}

/// Splits text into lines after normalizing line endings.
///
/// `\r\n` and lone `\r` count as line breaks. With
/// `keep_trailing_empty_line` the empty element after a final terminator is
/// kept, so `"a\n"` yields `["a", ""]`; otherwise it yields `["a"]`. Empty
/// text always yields a single empty line.
#[must_use]
pub fn split_lines(text: &str, keep_trailing_empty_line: bool) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    loop {
        match rest.find(['\r', '\n']) {
            Some(pos) => {
                lines.push(&rest[..pos]);
                let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }

    if !keep_trailing_empty_line && lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }

    lines
}
