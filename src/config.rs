use crate::appendix::label_to_index;
use crate::error::{Error, Result};
use std::path::PathBuf;

const DEFAULT_TARGETS_DIR: &str = "targets";
const DEFAULT_OUTPUT_DIR: &str = "listing_out";
const DEFAULT_FIRST_APPENDIX: &str = "А";
const DEFAULT_OUTPUT_PATTERN: &str = "{project}_listing_{index}.{ext}";

/// Default character budget per document.
pub const DEFAULT_MAX_CHARS: usize = 800_000;

/// How listings are distributed over output documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Start a new document when the next file would exceed this many
    /// characters; files larger than the budget are split into parts.
    CharBudget(usize),

    /// Spread whole files evenly over this many documents.
    DocumentCount(usize),
}

impl Default for Pagination {
    fn default() -> Self {
        Self::CharBudget(DEFAULT_MAX_CHARS)
    }
}

/// Configuration for a listing run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory holding one subdirectory per project
    pub targets_dir: PathBuf,

    /// Directory receiving one subdirectory of documents per project
    pub output_dir: PathBuf,

    /// Ignore file; when `None` the default locations are probed
    pub ignore_file: Option<PathBuf>,

    /// Extra ignore patterns applied after the ignore file
    pub ignore_patterns: Vec<String>,

    /// Appendix label of the first project
    pub first_appendix: String,

    /// Document filename pattern (supports {project}, {index}, {ext})
    pub output_pattern: String,

    /// Pagination policy
    pub pagination: Pagination,

    /// Keep the empty last line of files ending with a line break
    pub keep_trailing_empty_line: bool,

    /// Dry run mode (no file writes)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gost_listing::Config;
    ///
    /// let config = Config::builder()
    ///     .targets_dir("./targets")
    ///     .max_chars(500_000)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Targets directory doesn't exist
    /// - Pagination limits are zero
    /// - Output pattern is invalid
    /// - First appendix label is not a valid label
    pub fn validate(&self) -> Result<()> {
        if !self.targets_dir.exists() {
            return Err(Error::config(format!(
                "Targets directory does not exist: {}",
                self.targets_dir.display()
            )));
        }

        if !self.targets_dir.is_dir() {
            return Err(Error::config(format!(
                "Targets path is not a directory: {}",
                self.targets_dir.display()
            )));
        }

        match self.pagination {
            Pagination::CharBudget(0) => {
                return Err(Error::config("max_chars must be greater than 0"));
            }
            Pagination::DocumentCount(0) => {
                return Err(Error::config("document count must be greater than 0"));
            }
            _ => {}
        }

        if !self.output_pattern.contains("{index}") {
            return Err(Error::invalid_pattern(
                &self.output_pattern,
                "Pattern must contain {index} placeholder",
            ));
        }

        if !self.output_pattern.contains("{ext}") {
            return Err(Error::invalid_pattern(
                &self.output_pattern,
                "Pattern must contain {ext} placeholder",
            ));
        }

        if self.output_pattern.contains(['/', '\\']) {
            return Err(Error::invalid_pattern(
                &self.output_pattern,
                "Pattern must be a file name, not a path",
            ));
        }

        if label_to_index(&self.first_appendix).is_none() {
            return Err(Error::config(format!(
                "Appendix label '{}' must consist of letters of the Russian alphabet",
                self.first_appendix
            )));
        }

        if let Some(ref ignore_file) = self.ignore_file {
            if !ignore_file.is_file() {
                return Err(Error::config(format!(
                    "Ignore file does not exist: {}",
                    ignore_file.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets_dir: PathBuf::from(DEFAULT_TARGETS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ignore_file: None,
            ignore_patterns: Vec::new(),
            first_appendix: DEFAULT_FIRST_APPENDIX.to_string(),
            output_pattern: DEFAULT_OUTPUT_PATTERN.to_string(),
            pagination: Pagination::default(),
            keep_trailing_empty_line: true,
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    targets_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    ignore_file: Option<PathBuf>,
    ignore_patterns: Vec<String>,
    first_appendix: Option<String>,
    output_pattern: Option<String>,
    pagination: Option<Pagination>,
    keep_trailing_empty_line: Option<bool>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the directory holding the projects.
    #[must_use]
    pub fn targets_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.targets_dir = Some(path.into());
        self
    }

    /// Sets the output directory for generated documents.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the ignore file explicitly.
    #[must_use]
    pub fn ignore_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore_file = Some(path.into());
        self
    }

    /// Adds ignore patterns on top of the ignore file.
    #[must_use]
    pub fn ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the appendix label of the first project.
    #[must_use]
    pub fn first_appendix(mut self, label: impl Into<String>) -> Self {
        self.first_appendix = Some(label.into());
        self
    }

    /// Sets the document filename pattern.
    ///
    /// Pattern must contain `{index}` and `{ext}` placeholders.
    #[must_use]
    pub fn output_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.output_pattern = Some(pattern.into());
        self
    }

    /// Sets the pagination policy.
    #[must_use]
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Uses a character budget per document.
    #[must_use]
    pub fn max_chars(self, chars: usize) -> Self {
        self.pagination(Pagination::CharBudget(chars))
    }

    /// Spreads files over a fixed number of documents.
    #[must_use]
    pub fn documents(self, count: usize) -> Self {
        self.pagination(Pagination::DocumentCount(count))
    }

    /// Keeps or drops the empty last line of files ending with a line break.
    #[must_use]
    pub fn keep_trailing_empty_line(mut self, keep: bool) -> Self {
        self.keep_trailing_empty_line = Some(keep);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            targets_dir: self
                .targets_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGETS_DIR)),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            ignore_file: self.ignore_file,
            ignore_patterns: self.ignore_patterns,
            first_appendix: self
                .first_appendix
                .unwrap_or_else(|| DEFAULT_FIRST_APPENDIX.to_string()),
            output_pattern: self
                .output_pattern
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATTERN.to_string()),
            pagination: self.pagination.unwrap_or_default(),
            keep_trailing_empty_line: self.keep_trailing_empty_line.unwrap_or(true),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}
