//! Basic example of using gost-listing as a library
//!
//! Lists every project under `./targets` into `./listing_out`.

use gost_listing::{Config, Pipeline};

fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .targets_dir("./targets")
        .output_dir("./listing_out")
        .build()?;

    let stats = Pipeline::new(config)?.run()?;

    stats.print_summary();

    for project in &stats.projects {
        println!(
            "✓ Приложение {}: {} ({} files, {} documents)",
            project.appendix_label,
            project.name,
            project.files_listed,
            project.documents.len()
        );
    }

    Ok(())
}
