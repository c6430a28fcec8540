//! Document construction interface.
//!
//! The paginator decides *where* each listing goes; a [`DocumentSink`]
//! decides what a document looks like and how it is persisted. Listings are
//! appended in order: a heading, its code table, then a separator.

use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Position of a listing part within a split file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Part {
    /// 1-based part number
    pub index: usize,

    /// Number of parts the file was split into
    pub total: usize,
}

impl Part {
    /// Returns the suffix shown after the listing title, e.g. `часть 2/3`.
    #[must_use]
    pub fn suffix(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "часть {}/{}", self.index, self.total)
    }
}

/// Builds and persists output documents.
pub trait DocumentSink {
    /// Document under construction. Owned by the caller until saved.
    type Handle;

    /// Starts a document with the appendix header.
    fn new_document(&mut self, appendix_label: &str) -> Self::Handle;

    /// Appends a listing title.
    fn add_listing_heading(
        &mut self,
        doc: &mut Self::Handle,
        number: usize,
        relative_name: &str,
        part: Option<Part>,
    );

    /// Appends the numbered code table for the preceding heading.
    fn add_code_table(&mut self, doc: &mut Self::Handle, lines: &[&str], first_line: usize);

    /// Appends the blank paragraph that closes a listing.
    fn add_separator(&mut self, doc: &mut Self::Handle);

    /// Persists the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save(&mut self, doc: Self::Handle, path: &Path) -> Result<()>;
}

/// A listing as seen by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedListing {
    /// Listing number
    pub number: usize,

    /// Relative file name in the title
    pub relative_name: String,

    /// Part of a split file
    pub part: Option<Part>,

    /// Number of the first table row
    pub first_line: usize,

    /// Number of table rows
    pub line_count: usize,

    /// Row texts; empty when recording an outline only
    pub lines: Vec<String>,
}

/// A document as seen by a [`RecordingSink`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordedDocument {
    /// Where the document would be saved; empty until saved
    pub path: PathBuf,

    /// Appendix label in the header
    pub appendix_label: String,

    /// Listings in order
    pub listings: Vec<RecordedListing>,

    /// Separator paragraphs added
    pub separators: usize,
}

/// In-memory sink that keeps every saved document.
///
/// Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    keep_lines: bool,
    documents: Vec<RecordedDocument>,
}

impl RecordingSink {
    /// Records documents including every line of every listing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keep_lines: true,
            documents: Vec::new(),
        }
    }

    /// Records document structure and line counts only.
    #[must_use]
    pub fn outline() -> Self {
        Self {
            keep_lines: false,
            documents: Vec::new(),
        }
    }

    /// Returns the saved documents in save order.
    #[must_use]
    pub fn documents(&self) -> &[RecordedDocument] {
        &self.documents
    }

    /// Consumes the sink, returning the saved documents.
    #[must_use]
    pub fn into_documents(self) -> Vec<RecordedDocument> {
        self.documents
    }
}

impl DocumentSink for RecordingSink {
    type Handle = RecordedDocument;

    fn new_document(&mut self, appendix_label: &str) -> Self::Handle {
        RecordedDocument {
            appendix_label: appendix_label.to_string(),
            ..RecordedDocument::default()
        }
    }

    fn add_listing_heading(
        &mut self,
        doc: &mut Self::Handle,
        number: usize,
        relative_name: &str,
        part: Option<Part>,
    ) {
        doc.listings.push(RecordedListing {
            number,
            relative_name: relative_name.to_string(),
            part,
            first_line: 0,
            line_count: 0,
            lines: Vec::new(),
        });
    }

    fn add_code_table(&mut self, doc: &mut Self::Handle, lines: &[&str], first_line: usize) {
        if let Some(listing) = doc.listings.last_mut() {
            listing.first_line = first_line;
            listing.line_count = lines.len();
            if self.keep_lines {
                listing.lines = lines.iter().map(|&l| l.to_string()).collect();
            }
        }
    }

    fn add_separator(&mut self, doc: &mut Self::Handle) {
        doc.separators += 1;
    }

    fn save(&mut self, mut doc: Self::Handle, path: &Path) -> Result<()> {
        doc.path = path.to_path_buf();
        self.documents.push(doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_suffix() {
        let part = Part { index: 2, total: 3 };
        assert_eq!(part.suffix(), "часть 2/3");
    }

    #[test]
    fn test_recording_sink_records_listing() {
        let mut sink = RecordingSink::new();
        let mut doc = sink.new_document("Б");

        sink.add_listing_heading(&mut doc, 4, "src/a.py", None);
        sink.add_code_table(&mut doc, &["x = 1", ""], 1);
        sink.add_separator(&mut doc);
        sink.save(doc, Path::new("out/p_listing_1.docx")).unwrap();

        let docs = sink.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].appendix_label, "Б");
        assert_eq!(docs[0].path, PathBuf::from("out/p_listing_1.docx"));
        assert_eq!(docs[0].separators, 1);

        let listing = &docs[0].listings[0];
        assert_eq!(listing.number, 4);
        assert_eq!(listing.first_line, 1);
        assert_eq!(listing.lines, vec!["x = 1", ""]);
    }

    #[test]
    fn test_outline_sink_keeps_counts_only() {
        let mut sink = RecordingSink::outline();
        let mut doc = sink.new_document("А");

        sink.add_listing_heading(&mut doc, 1, "big.c", Some(Part { index: 1, total: 2 }));
        sink.add_code_table(&mut doc, &["a", "b", "c"], 1);
        sink.save(doc, Path::new("big_1.docx")).unwrap();

        let listing = &sink.documents()[0].listings[0];
        assert_eq!(listing.line_count, 3);
        assert!(listing.lines.is_empty());
    }
}
