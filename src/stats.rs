//! Corpus statistics.
//!
//! Runs the corpus loader without embedding anything and prints what a
//! retrieval session would index: chunk counts per file, skipped records,
//! total characters, and whether the `max_chunks` cap cut the scan short.

use anyhow::Result;

use crate::config::Config;
use crate::corpus::{self, LoadReport};

/// Run the stats command: load the corpus and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let report = corpus::load_corpus(&config.corpus)?;
    print!("{}", format_report(&report, config.corpus.max_chunks));
    Ok(())
}

/// Format a load report as the `ctxr stats` text block.
pub fn format_report(report: &LoadReport, max_chunks: usize) -> String {
    let total_chars: usize = report.chunks.iter().map(|c| c.char_len()).sum();
    let avg_chars = if report.chunks.is_empty() {
        0
    } else {
        total_chars / report.chunks.len()
    };

    let mut out = String::new();
    out.push_str("Context Retrieval — Corpus Stats\n");
    out.push_str("================================\n\n");
    out.push_str(&format!(
        "  Chunks:      {} / {} max{}\n",
        report.chunks.len(),
        max_chunks,
        if report.cap_reached { " (cap reached)" } else { "" }
    ));
    out.push_str(&format!("  Files:       {}\n", report.files.len()));
    out.push_str(&format!("  Characters:  {} (avg {} per chunk)\n", total_chars, avg_chars));
    out.push_str(&format!(
        "  Skipped:     {} malformed, {} without text\n",
        report.skipped_malformed, report.skipped_missing_text
    ));

    for missing in &report.missing_locations {
        out.push_str(&format!("  Missing:     {}\n", missing.display()));
    }

    if !report.files.is_empty() {
        out.push_str("\n  By file:\n");
        out.push_str(&format!("  {:<48} {:>8}\n", "FILE", "CHUNKS"));
        out.push_str(&format!("  {}\n", "-".repeat(57)));
        for f in &report.files {
            out.push_str(&format!("  {:<48} {:>8}\n", f.path.display(), f.loaded));
        }
    }

    out.push('\n');
    out
}
