//! # gost-listing
//!
//! Turns directories of source code into program listings for engineering
//! reports: numbered lines in a bordered two-column table, Courier New 12 pt,
//! one appendix per project, paginated into `.docx` documents.
//!
//! ## Features
//!
//! - Ignore rules with directory, rooted and glob patterns
//! - Deterministic, case-insensitive file ordering
//! - Character budget per document; oversized files split into parts
//! - Appendix labels `А`, `Б`, …, `Я`, `АА`, …
//! - Atomic document writes and a dry-run mode
//!
//! ## Quick Start
//!
//! ```no_run
//! use gost_listing::{Config, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .targets_dir("./targets")
//!     .output_dir("./listing_out")
//!     .max_chars(800_000)
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Scanner**: discovers projects and selects files through ignore rules
//! 2. **Reader**: decodes and sanitizes each file
//! 3. **Paginator**: places listings into documents
//! 4. **Sink**: builds and saves documents (`.docx`, or in memory)

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod appendix;
mod config;
mod error;
mod file;
mod filter;
mod pipeline;
mod scanner;
mod sink;
mod splitter;
mod template;
mod writer;

pub use appendix::{index_to_label, label_to_index, LabelSequence, ALPHABET};
pub use config::{Config, ConfigBuilder, Pagination, DEFAULT_MAX_CHARS};
pub use error::{Error, Result};
pub use file::{
    is_document_safe, read_project_file, sanitize, split_lines, FileCandidate, FileOutcome,
    ProjectFile,
};
pub use filter::{IgnoreRule, IgnoreRules};
pub use pipeline::{Pipeline, ProjectReport, RunStats, SkippedFile, DOCX_EXTENSION};
pub use scanner::{discover_projects, Project, ScanStats, Scanner};
pub use sink::{DocumentSink, Part, RecordedDocument, RecordedListing, RecordingSink};
pub use splitter::{
    compute_line_blocks, OutputNaming, PaginationReport, PaginationState, Paginator, Placement,
    SavedDocument,
};
pub use writer::{listing_title, DocxDocument, DocxWriter};

/// Runs the complete listing pipeline with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - Targets directory doesn't exist or is inaccessible
/// - The ignore file is malformed
/// - A document cannot be written
///
/// # Examples
///
/// ```no_run
/// use gost_listing::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .targets_dir("targets")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<RunStats> {
    Pipeline::new(config)?.run()
}
