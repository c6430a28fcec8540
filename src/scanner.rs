use crate::{
    error::{Error, Result},
    file::FileCandidate,
    filter::IgnoreRules,
};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Regular files found under the project root
    pub total_files: usize,

    /// Files excluded by an ignore rule
    pub ignored_files: usize,

    /// Walk errors encountered
    pub errors: usize,
}

/// A project directory inside the targets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Directory name, also used for output naming
    pub name: String,

    /// Path to the project directory
    pub root: PathBuf,
}

/// Lists project directories, sorted case-insensitively by name.
///
/// Plain files in the targets directory are not projects. A directory that
/// is the output directory itself is skipped.
///
/// # Errors
///
/// Returns an error if the targets directory cannot be read.
pub fn discover_projects(targets_dir: &Path, output_dir: &Path) -> Result<Vec<Project>> {
    let output_dir = canonical_or_none(output_dir);
    let mut projects = Vec::new();

    for entry in WalkDir::new(targets_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(targets_dir).to_path_buf();
            match e.into_io_error() {
                Some(io) => Error::io(path, io),
                None => Error::config(format!("Cannot list {}", path.display())),
            }
        })?;

        // A link to a directory is a project too.
        let file_type = entry.file_type();
        if !(file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir())) {
            continue;
        }

        if output_dir.is_some() && canonical_or_none(entry.path()) == output_dir {
            debug!("Skipping output directory inside targets: {}", entry.path().display());
            continue;
        }

        projects.push(Project {
            name: entry.file_name().to_string_lossy().into_owned(),
            root: entry.into_path(),
        });
    }

    projects.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(projects)
}

/// Selects the files of one project.
pub struct Scanner<'a> {
    rules: &'a IgnoreRules,
    output_dir: Option<PathBuf>,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner that applies `rules` and never descends into
    /// `output_dir`.
    #[must_use]
    pub fn new(rules: &'a IgnoreRules, output_dir: &Path) -> Self {
        Self {
            rules,
            output_dir: canonical_or_none(output_dir),
        }
    }

    /// Walks `root` and returns the eligible files, sorted by lower-cased
    /// relative path.
    #[must_use]
    pub fn scan(&self, root: &Path) -> (Vec<FileCandidate>, ScanStats) {
        let mut files = Vec::new();
        let mut stats = ScanStats::default();

        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        debug!("Scanning {}", root.display());

        let mut builder = WalkBuilder::new(&root);
        builder.standard_filters(false).follow_links(false);

        // Output may be nested inside the scanned tree.
        if let Some(out) = self.output_dir.clone() {
            builder.filter_entry(move |entry| !entry.path().starts_with(&out));
        }

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    stats.errors += 1;
                    continue;
                }
            };

            // Links to files are listed; links to directories are not walked.
            let is_file = entry
                .file_type()
                .is_some_and(|ft| ft.is_file() || (ft.is_symlink() && entry.path().is_file()));
            if !is_file {
                continue;
            }
            stats.total_files += 1;

            let relative_path = relative_posix(entry.path(), &root);
            let candidate = FileCandidate::new(entry.path(), relative_path);

            let rule = self
                .rules
                .matching_rule(&candidate.relative_path, candidate.name());
            if let Some(rule) = rule {
                trace!("Ignored {} (rule '{}')", candidate.relative_path, rule.pattern());
                stats.ignored_files += 1;
                continue;
            }

            files.push(candidate);
        }

        files.sort_by(|a, b| {
            a.relative_path
                .to_lowercase()
                .cmp(&b.relative_path.to_lowercase())
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });

        debug!(
            "Scan complete: {} total, {} selected, {} ignored, {} errors",
            stats.total_files,
            files.len(),
            stats.ignored_files,
            stats.errors
        );

        (files, stats)
    }
}

/// Canonical form of an existing path; `None` if it does not exist.
fn canonical_or_none(path: &Path) -> Option<PathBuf> {
    path.canonicalize().ok()
}

/// Relative path from `root` with `/` separators on every platform.
fn relative_posix(path: &Path, root: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());

    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
