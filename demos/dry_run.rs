//! Plans documents without writing them.
//!
//! Uses the in-memory sink to show where every listing would land.

use gost_listing::{Config, Pipeline, RecordingSink};

fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .targets_dir("./targets")
        .max_chars(200_000)
        .ignore_patterns(["target/", ".git/", "*.lock"])
        .build()?;

    let pipeline = Pipeline::new(config)?;
    let mut sink = RecordingSink::outline();
    let stats = pipeline.run_with(&mut sink)?;

    for doc in sink.documents() {
        println!("{} (Приложение {})", doc.path.display(), doc.appendix_label);
        for listing in &doc.listings {
            let part = listing
                .part
                .map(|p| format!(" ({p})"))
                .unwrap_or_default();
            println!(
                "  Листинг {} {}{}: lines {}..{}",
                listing.number,
                listing.relative_name,
                part,
                listing.first_line,
                listing.first_line + listing.line_count.saturating_sub(1)
            );
        }
    }

    println!("\n{}", stats.to_json()?);
    Ok(())
}
