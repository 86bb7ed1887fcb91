// The index is built once by the ingestion task and then published into a
// `SharedIndex`. After publication nothing can mutate it, so query scans read
// it without locking.

use super::{ensure_finite, project_to_plane, Point2D};
use crate::corpus::MIN_ENTRY_CHARS;
use crate::embedder::Embedder;
use crate::progress::{Progress, ProgressReporter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

#[derive(Clone, Debug)]
pub struct CorpusEntry {
    pub text: String,
    pub embedding: Vec<f32>,
    pub position: Point2D,
}

#[derive(Debug, Default)]
pub struct CorpusIndex {
    entries: Vec<CorpusEntry>,
    dim: Option<usize>,
    /// texts below the length threshold, never embedded
    dropped: usize,
    /// texts whose embedding failed
    skipped: usize,
}

impl CorpusIndex {
    /// Embed and place every usable text, in input order. A text that fails
    /// to embed is logged and skipped; the build itself never fails.
    pub async fn build(
        texts: Vec<String>,
        embedder: &dyn Embedder,
        progress: &ProgressReporter,
    ) -> CorpusIndex {
        let total_input = texts.len();
        let texts: Vec<String> = texts
            .into_iter()
            .filter(|t| t.trim().chars().count() >= MIN_ENTRY_CHARS)
            .collect();
        let total = texts.len();
        let mut index = CorpusIndex {
            dropped: total_input - total,
            ..CorpusIndex::default()
        };
        progress.report(Progress::Ingesting {
            attempted: 0,
            total,
            skipped: 0,
        });

        let start = Instant::now();
        for (attempted, text) in texts.into_iter().enumerate() {
            match embedder.embed(&text, true).await {
                Ok(embedding) => {
                    if let Err(e) = index.push(text, embedding) {
                        warn!("index entry {} rejected: {}", attempted, e);
                        index.skipped += 1;
                    }
                }
                Err(e) => {
                    warn!("embedding entry {} failed, skipping: {}", attempted, e);
                    index.skipped += 1;
                }
            }
            progress.report(Progress::Ingesting {
                attempted: attempted + 1,
                total,
                skipped: index.skipped,
            });
        }
        info!(
            "index built with {}: {} entries, {} skipped, {} dropped, spends {}s",
            embedder.name(),
            index.entries.len(),
            index.skipped,
            index.dropped,
            start.elapsed().as_secs_f64()
        );

        index
    }

    fn push(&mut self, text: String, embedding: Vec<f32>) -> anyhow::Result<()> {
        match self.dim {
            Some(dim) if dim != embedding.len() => {
                anyhow::bail!("dimension {} differs from index dimension {}", embedding.len(), dim)
            }
            _ => {}
        }
        ensure_finite(&embedding)?;
        self.dim = Some(embedding.len());
        let position = project_to_plane(&embedding);
        debug!("entry {:?} placed at ({}, {})", text, position.x, position.y);
        self.entries.push(CorpusEntry {
            text,
            embedding,
            position,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension of the stored embeddings, `None` while empty.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Set-once handle to the built index. Empty until ingestion publishes.
#[derive(Clone, Default)]
pub struct SharedIndex {
    cell: Arc<OnceCell<CorpusIndex>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(index: CorpusIndex) -> Self {
        let shared = Self::new();
        // a fresh cell can't already be set
        let _ = shared.publish(index);
        shared
    }

    pub fn publish(&self, index: CorpusIndex) -> anyhow::Result<()> {
        self.cell
            .set(index)
            .map_err(|_| anyhow::anyhow!("index already published"))
    }

    pub fn get(&self) -> Option<&CorpusIndex> {
        self.cell.get()
    }
}
