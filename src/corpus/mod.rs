//! Reference texts the index is built from.
//!
//! The source is line oriented: a header line, then one text per line,
//! optionally wrapped in quotes.

use anyhow::Result;
use std::path::Path;
use tokio::fs;

/// Texts shorter than this never reach the embedder.
pub const MIN_ENTRY_CHARS: usize = 5;

const EMBEDDED: &str = include_str!("../../data/startups.csv");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    File,
    Embedded,
}

pub struct CorpusSource {
    pub origin: Origin,
    pub texts: Vec<String>,
}

/// Parse a corpus listing: drop the header, trim, strip one pair of
/// surrounding quotes, drop anything shorter than [`MIN_ENTRY_CHARS`].
pub fn parse_listing(content: &str) -> Vec<String> {
    content
        .lines()
        .skip(1)
        .map(|line| strip_quotes(line.trim()).trim())
        .filter(|line| line.chars().count() >= MIN_ENTRY_CHARS)
        .map(|line| line.to_owned())
        .collect()
}

fn strip_quotes(line: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = line
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    line
}

pub fn embedded() -> CorpusSource {
    CorpusSource {
        origin: Origin::Embedded,
        texts: parse_listing(EMBEDDED),
    }
}

/// Read the listing at `path`, or fall back to the embedded list when no
/// path is configured, the file can't be read, or it holds no usable texts.
pub async fn load(path: Option<&Path>) -> CorpusSource {
    let Some(path) = path else {
        info!("no corpus path configured, using embedded list");
        return embedded();
    };
    match read_listing(path).await {
        Ok(texts) if !texts.is_empty() => {
            info!("corpus loaded from {}: {} texts", path.display(), texts.len());
            CorpusSource {
                origin: Origin::File,
                texts,
            }
        }
        Ok(_) => {
            warn!("corpus {} has no usable texts, using embedded list", path.display());
            embedded()
        }
        Err(e) => {
            warn!("read corpus {} failed: {}, using embedded list", path.display(), e);
            embedded()
        }
    }
}

async fn read_listing(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).await?;
    let content = content.replace("\r\n", "\n");
    Ok(parse_listing(&content))
}
