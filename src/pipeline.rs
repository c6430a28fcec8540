use crate::{
    appendix::LabelSequence,
    config::Config,
    error::{Error, Result},
    file::{read_project_file, FileOutcome},
    filter::IgnoreRules,
    scanner::{discover_projects, Project, Scanner},
    sink::{DocumentSink, RecordingSink},
    splitter::{OutputNaming, Paginator},
    writer::DocxWriter,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Extension of written documents.
pub const DOCX_EXTENSION: &str = "docx";

/// A selected file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Path relative to the project root
    pub relative_path: String,

    /// Why it was left out
    pub reason: String,
}

/// What happened to one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    /// Project directory name
    pub name: String,

    /// Appendix label of the project
    pub appendix_label: String,

    /// Regular files found under the project root
    pub files_found: usize,

    /// Files excluded by ignore rules
    pub files_ignored: usize,

    /// Files that passed selection
    pub files_selected: usize,

    /// Files that received a listing
    pub files_listed: usize,

    /// Selected files that could not be read
    pub skipped: Vec<SkippedFile>,

    /// Directory walk errors
    pub walk_errors: usize,

    /// Files split into parts
    pub split_files: usize,

    /// Documents written (or planned, in a dry run)
    pub documents: Vec<PathBuf>,
}

impl ProjectReport {
    fn new(project: &Project, appendix_label: &str) -> Self {
        Self {
            name: project.name.clone(),
            appendix_label: appendix_label.to_string(),
            files_found: 0,
            files_ignored: 0,
            files_selected: 0,
            files_listed: 0,
            skipped: Vec::new(),
            walk_errors: 0,
            split_files: 0,
            documents: Vec::new(),
        }
    }
}

/// Statistics collected during a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Per-project reports, in processing order
    pub projects: Vec<ProjectReport>,

    /// Files listed across all projects
    pub total_files_listed: usize,

    /// Files skipped across all projects
    pub total_files_skipped: usize,

    /// Documents written across all projects
    pub total_documents: usize,

    /// Files split into parts across all projects
    pub total_split_files: usize,

    /// Total execution time
    pub duration: Duration,

    /// Output directory path
    pub output_directory: String,

    /// Whether this was a dry run
    pub dry_run: bool,
}

impl RunStats {
    /// Aggregates project reports.
    #[must_use]
    pub fn new(
        projects: Vec<ProjectReport>,
        duration: Duration,
        output_directory: String,
        dry_run: bool,
    ) -> Self {
        let total_files_listed = projects.iter().map(|p| p.files_listed).sum();
        let total_files_skipped = projects.iter().map(|p| p.skipped.len()).sum();
        let total_documents = projects.iter().map(|p| p.documents.len()).sum();
        let total_split_files = projects.iter().map(|p| p.split_files).sum();

        Self {
            projects,
            total_files_listed,
            total_files_skipped,
            total_documents,
            total_split_files,
            duration,
            output_directory,
            dry_run,
        }
    }

    /// Serializes the statistics as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        if self.dry_run {
            println!("║              Listing Summary (dry run)                ║");
        } else {
            println!("║                  Listing Summary                      ║");
        }
        println!("╠═══════════════════════════════════════════════════════╣");
        for project in &self.projects {
            println!(
                "║ {:<4} {:<28} {:>5} files {:>4} docs ║",
                project.appendix_label,
                truncate(&project.name, 28),
                project.files_listed,
                project.documents.len()
            );
        }
        if !self.projects.is_empty() {
            println!("║                                                       ║");
        }
        println!(
            "║ Projects:             {:>8}                        ║",
            self.projects.len()
        );
        println!(
            "║ Files Listed:         {:>8}                        ║",
            self.total_files_listed
        );
        println!(
            "║ Files Skipped:        {:>8}                        ║",
            self.total_files_skipped
        );
        println!(
            "║ Files Split:          {:>8}                        ║",
            self.total_split_files
        );
        println!(
            "║ Documents:            {:>8}                        ║",
            self.total_documents
        );
        println!("║ Output Directory:                                     ║");
        println!("║   {}", self.output_directory);
        println!(
            "║ Total Time:           {:>8.2}s                       ║",
            self.duration.as_secs_f64()
        );
        if self.dry_run {
            println!("║ ⚠ No files were written (dry run mode)               ║");
        }
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Main orchestrator: projects in, listing documents out.
pub struct Pipeline {
    config: Config,
    rules: IgnoreRules,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The ignore file cannot be read or holds a malformed pattern
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let rules = load_rules(&config)?;

        Ok(Self { config, rules })
    }

    /// Returns the ignore rules in effect.
    #[must_use]
    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Runs every project and writes `.docx` documents, or only plans them
    /// in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the targets directory cannot be listed or a
    /// document cannot be written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gost_listing::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .targets_dir("./targets")
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    pub fn run(&self) -> Result<RunStats> {
        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
            let mut sink = RecordingSink::outline();
            self.run_with(&mut sink)
        } else {
            let mut sink = DocxWriter::new()?;
            self.run_with(&mut sink)
        }
    }

    /// Runs every project against the given sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the targets directory cannot be listed or the
    /// sink fails to save a document.
    #[instrument(skip(self, sink), fields(targets = %self.config.targets_dir.display()))]
    pub fn run_with<S: DocumentSink>(&self, sink: &mut S) -> Result<RunStats> {
        let start_time = Instant::now();

        let projects = discover_projects(&self.config.targets_dir, &self.config.output_dir)?;
        if projects.is_empty() {
            warn!(
                "No projects found in {}",
                self.config.targets_dir.display()
            );
        } else {
            info!("Found {} projects", projects.len());
        }

        let labels = LabelSequence::starting_at(&self.config.first_appendix).ok_or_else(|| {
            Error::config(format!(
                "Invalid appendix label '{}'",
                self.config.first_appendix
            ))
        })?;

        let mut reports = Vec::with_capacity(projects.len());
        for (project, label) in projects.iter().zip(labels) {
            reports.push(self.process_project(project, &label, sink)?);
        }

        let duration = start_time.elapsed();
        let stats = RunStats::new(
            reports,
            duration,
            self.config.output_dir.display().to_string(),
            self.config.dry_run,
        );

        info!(
            "✓ Listed {} files into {} documents in {:.2}s",
            stats.total_files_listed,
            stats.total_documents,
            duration.as_secs_f64()
        );

        Ok(stats)
    }

    fn process_project<S: DocumentSink>(
        &self,
        project: &Project,
        label: &str,
        sink: &mut S,
    ) -> Result<ProjectReport> {
        info!("Project {} (Приложение {})", project.name, label);
        let mut report = ProjectReport::new(project, label);

        let scanner = Scanner::new(&self.rules, &self.config.output_dir);
        let (candidates, scan_stats) = scanner.scan(&project.root);

        report.files_found = scan_stats.total_files;
        report.files_ignored = scan_stats.ignored_files;
        report.walk_errors = scan_stats.errors;
        report.files_selected = candidates.len();

        if candidates.is_empty() {
            warn!("Project {} has no files to list", project.name);
            return Ok(report);
        }

        self.list_files(
            project,
            label,
            sink,
            candidates.iter().map(read_project_file),
            &mut report,
        )?;

        if report.files_listed == 0 {
            warn!("Project {}: no file could be read", project.name);
        }

        if self.config.dry_run {
            for path in &report.documents {
                info!("Would write {}", path.display());
            }
        }

        info!(
            "✓ {}: {} files -> {} documents",
            project.name,
            report.files_listed,
            report.documents.len()
        );

        Ok(report)
    }

    /// Paginates classified files into documents, recording skipped ones.
    ///
    /// Outcomes are consumed lazily, so at most one file body is held at a
    /// time. Skipped files consume no listing number.
    fn list_files<S, I>(
        &self,
        project: &Project,
        label: &str,
        sink: &mut S,
        outcomes: I,
        report: &mut ProjectReport,
    ) -> Result<()>
    where
        S: DocumentSink,
        I: IntoIterator<Item = FileOutcome>,
    {
        let naming = OutputNaming::new(
            self.config.output_dir.join(&project.name),
            &project.name,
            &self.config.output_pattern,
            DOCX_EXTENSION,
        );

        let mut paginator = Paginator::new(
            sink,
            &naming,
            label,
            self.config.pagination,
            report.files_selected,
            self.config.keep_trailing_empty_line,
        );

        for outcome in outcomes {
            match outcome {
                FileOutcome::Loaded(file) => {
                    paginator.push(&file)?;
                    report.files_listed += 1;
                }
                FileOutcome::Skipped {
                    relative_path,
                    reason,
                } => report.skipped.push(SkippedFile {
                    relative_path,
                    reason,
                }),
            }
        }

        let pagination = paginator.finish()?;
        report.split_files = pagination.split_files;
        report.documents = pagination
            .documents
            .into_iter()
            .map(|doc| doc.path)
            .collect();

        Ok(())
    }
}

/// Loads the explicit or auto-located ignore file, then the extra patterns.
fn load_rules(config: &Config) -> Result<IgnoreRules> {
    let path = config
        .ignore_file
        .clone()
        .or_else(|| IgnoreRules::locate(&config.targets_dir));

    let mut rules = match path {
        Some(path) => {
            info!("Using ignore file {}", path.display());
            IgnoreRules::load(&path)?
        }
        None => {
            debug!("No ignore file found");
            IgnoreRules::new()
        }
    };

    rules.extend_lines(&config.ignore_patterns)?;
    debug!("{} ignore rules in effect", rules.len());
    Ok(rules)
}
