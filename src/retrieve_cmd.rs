//! `ctxr retrieve`: load the corpus, build the index, and print one bundle.

use anyhow::{bail, Context, Result};
use std::fmt::Write as _;

use context_retrieval_core::index::RetrievalIndex;
use context_retrieval_core::models::ContextBundle;

use crate::config::Config;
use crate::corpus;
use crate::embedding::{self, EmbeddingProvider};

/// Index type used by the CLI: the provider is chosen at runtime.
pub type SessionIndex = RetrievalIndex<Box<dyn EmbeddingProvider>>;

/// Per-call overrides and output flags shared by `retrieve` and `session`.
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    pub top_n: Option<usize>,
    pub max_chars: Option<usize>,
    pub explain: bool,
    pub json: bool,
}

/// Effective `top_n` / `max_chars` for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub top_n: usize,
    pub max_chars: usize,
}

impl Limits {
    /// Merge CLI overrides over config values.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is zero.
    pub fn resolve(config: &Config, opts: &RetrieveOptions) -> Result<Self> {
        let top_n = opts.top_n.unwrap_or(config.retrieval.top_n);
        let max_chars = opts.max_chars.unwrap_or(config.retrieval.max_total_chars);
        if top_n == 0 {
            bail!("--top-n must be > 0");
        }
        if max_chars == 0 {
            bail!("--max-chars must be > 0");
        }
        Ok(Self { top_n, max_chars })
    }
}

/// Load the configured corpus and build an index over it.
///
/// # Errors
///
/// Returns an error if the provider cannot be created or the corpus
/// cannot be embedded. An empty corpus is not an error.
pub fn open_index(config: &Config) -> Result<SessionIndex> {
    let report = corpus::load_corpus(&config.corpus)?;
    let provider = embedding::create_provider(&config.embedding)
        .context("Failed to create embedding provider")?;
    let index = RetrievalIndex::build(provider, report.chunks)?;
    Ok(index)
}

pub fn run_retrieve(config: &Config, query: &str, opts: &RetrieveOptions) -> Result<()> {
    let limits = Limits::resolve(config, opts)?;

    if query.trim().is_empty() {
        println!("No context selected.");
        return Ok(());
    }

    let index = open_index(config)?;
    let bundle = index.retrieve(query, limits.top_n, limits.max_chars)?;
    print!("{}", render_bundle(&bundle, &config.retrieval.separator, opts)?);
    Ok(())
}

/// Render a bundle for stdout according to the output flags.
///
/// Plain output is the prompt-ready context: chunk texts joined with
/// `separator`. `--explain` prefixes each chunk with its rank, score,
/// provenance, and size. `--json` emits the whole bundle.
pub fn render_bundle(
    bundle: &ContextBundle,
    separator: &str,
    opts: &RetrieveOptions,
) -> Result<String> {
    if opts.json {
        let mut out = serde_json::to_string_pretty(bundle)?;
        out.push('\n');
        return Ok(out);
    }

    if bundle.is_empty() {
        return Ok("No context selected.\n".to_string());
    }

    let mut out = String::new();
    if opts.explain {
        for chunk in &bundle.chunks {
            writeln!(
                out,
                "#{} score={:.4} source={} chars={}",
                chunk.rank + 1,
                chunk.score,
                chunk.source,
                chunk.chars
            )?;
            writeln!(out, "{}", chunk.text)?;
            writeln!(out)?;
        }
        writeln!(
            out,
            "{} chunk(s), {} chars{}",
            bundle.len(),
            bundle.total_chars,
            if bundle.truncated_by_budget {
                " (budget reached)"
            } else {
                ""
            }
        )?;
    } else {
        out.push_str(&bundle.join(separator));
        out.push('\n');
    }
    Ok(out)
}
