use anyhow::Result;

use crate::config::Config;
use crate::corpus;

/// Print each configured corpus location with its status and file count.
pub fn list_sources(config: &Config) -> Result<()> {
    let include = corpus::build_globset(&config.corpus.include_globs)?;

    if config.corpus.locations.is_empty() {
        println!("No corpus locations configured. Add [corpus] locations to the config.");
        return Ok(());
    }

    println!("{:<40} {:<10} FILES", "LOCATION", "STATUS");
    for location in &config.corpus.locations {
        match corpus::list_chunk_files(location, &include, config.corpus.follow_symlinks) {
            Ok(files) => println!("{:<40} {:<10} {}", location.display(), "OK", files.len()),
            Err(_) => println!("{:<40} {:<10} -", location.display(), "MISSING"),
        }
    }

    Ok(())
}
