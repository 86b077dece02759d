//! `ctxr session`: build the index once, then answer one query per line.
//!
//! The index lives for the whole session and is only read after it is
//! built, so every query sees the same corpus state.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

use context_retrieval_core::embedding::EmbeddingProvider;
use context_retrieval_core::index::RetrievalIndex;

use crate::config::Config;
use crate::retrieve_cmd::{self, Limits, RetrieveOptions};

pub fn run_session(config: &Config, opts: &RetrieveOptions) -> Result<()> {
    let limits = Limits::resolve(config, opts)?;
    let index = retrieve_cmd::open_index(config)?;
    eprintln!(
        "Indexed {} chunk(s) with '{}'. Enter one query per line; EOF ends the session.",
        index.len(),
        index.model_name()
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let answered = answer_queries(
        &index,
        stdin.lock(),
        stdout.lock(),
        limits,
        &config.retrieval.separator,
        opts,
    )?;
    debug!(answered, "session ended");
    Ok(())
}

/// Answer each non-blank line of `input` with a rendered bundle.
///
/// Returns the number of queries answered. An embedding failure on any
/// query ends the session with that error.
pub fn answer_queries<P: EmbeddingProvider, R: BufRead, W: Write>(
    index: &RetrievalIndex<P>,
    input: R,
    mut output: W,
    limits: Limits,
    separator: &str,
    opts: &RetrieveOptions,
) -> Result<usize> {
    let mut answered = 0;
    for line in input.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        let bundle = index.retrieve(query, limits.top_n, limits.max_chars)?;
        write!(
            output,
            "{}",
            retrieve_cmd::render_bundle(&bundle, separator, opts)?
        )?;
        output.flush()?;
        answered += 1;
    }
    Ok(answered)
}
