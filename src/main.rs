use anyhow::Context;
use clap::Parser;
use gost_listing::{Config, Pipeline, DEFAULT_MAX_CHARS};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "gost-listing",
    version,
    author,
    about = "Generate GOST-style program listings as .docx documents",
    long_about = "Generate GOST-style program listings as .docx documents.\n\n\
    Every subdirectory of the targets directory is a project. Each project becomes \
    an appendix: its files are listed with numbered lines in a bordered table and \
    paginated into documents under the output directory.\n\n\
    USAGE EXAMPLES:\n  \
      # List every project in ./targets\n  \
      gost-listing\n\n  \
      # Smaller documents, extra ignore rules\n  \
      gost-listing --max-chars 300000 -i '*.lock' -i dist/\n\n  \
      # Spread each project over three documents, start at appendix В\n  \
      gost-listing -n 3 --appendix В\n\n  \
      # Show what would be written\n  \
      gost-listing --dry-run --json"
)]
struct Cli {
    /// Directory holding one subdirectory per project
    #[arg(short, long, default_value = "targets", value_name = "DIR")]
    targets: PathBuf,

    /// Output directory for generated documents
    #[arg(short, long, default_value = "listing_out", value_name = "DIR")]
    out: PathBuf,

    /// Ignore file (default: ignore.txt beside or inside the targets directory)
    #[arg(long, value_name = "FILE")]
    ignore_file: Option<PathBuf>,

    /// Extra ignore pattern (can be used multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Appendix label of the first project
    #[arg(long, default_value = "А", value_name = "LABEL")]
    appendix: String,

    /// Output filename pattern
    #[arg(long, default_value = "{project}_listing_{index}.{ext}")]
    pattern: String,

    /// Max characters of code per document
    #[arg(long, default_value_t = DEFAULT_MAX_CHARS, conflicts_with = "documents")]
    max_chars: usize,

    /// Spread whole files over this many documents per project
    #[arg(short = 'n', long, value_name = "N")]
    documents: Option<usize>,

    /// Drop the empty last line of files ending with a line break
    #[arg(long)]
    drop_trailing_empty_line: bool,

    /// Dry run (don't write files)
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let mut builder = Config::builder()
        .targets_dir(cli.targets)
        .output_dir(cli.out)
        .ignore_patterns(cli.ignore)
        .first_appendix(cli.appendix)
        .output_pattern(cli.pattern)
        .keep_trailing_empty_line(!cli.drop_trailing_empty_line)
        .dry_run(cli.dry_run);

    builder = match cli.documents {
        Some(count) => builder.documents(count),
        None => builder.max_chars(cli.max_chars),
    };

    if let Some(ignore_file) = cli.ignore_file {
        builder = builder.ignore_file(ignore_file);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Listing generation failed")?;

    if cli.json {
        println!("{}", stats.to_json()?);
    } else {
        stats.print_summary();
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("gost_listing=info"),
        1 => EnvFilter::new("gost_listing=debug"),
        _ => EnvFilter::new("gost_listing=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}
