use super::index::SharedIndex;
use super::matching::best_match;
use super::{ensure_finite, project_to_plane, Point2D};
use crate::assessment::TieredAssessor;
use crate::embedder::Embedder;
use crate::error::QueryError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Pitches shorter than this are rejected before any embedding call.
pub const MIN_QUERY_CHARS: usize = 15;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub position: Point2D,
    pub best_similarity: f32,
    pub novelty_score: u8,
    pub title: String,
    pub description: String,
}

/// `clamp(round((1 - similarity) * 10), 1, 10)`; NaN scores as fully novel.
pub fn novelty_score(best_similarity: f32) -> u8 {
    if best_similarity.is_nan() {
        return 10;
    }
    ((1.0 - best_similarity) * 10.0).round().clamp(1.0, 10.0) as u8
}

#[derive(Clone)]
pub struct QueryEngine {
    index: SharedIndex,
    embedder: Arc<dyn Embedder>,
    assessor: Arc<TieredAssessor>,
}

impl QueryEngine {
    pub fn new(
        index: SharedIndex,
        embedder: Arc<dyn Embedder>,
        assessor: Arc<TieredAssessor>,
    ) -> Self {
        Self {
            index,
            embedder,
            assessor,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.index.get().is_some()
    }

    pub async fn query(&self, text: &str) -> Result<QueryResult, QueryError> {
        let text = text.trim();
        let actual = text.chars().count();
        if actual < MIN_QUERY_CHARS {
            return Err(QueryError::InvalidInput {
                min: MIN_QUERY_CHARS,
                actual,
            });
        }
        let index = self.index.get().ok_or(QueryError::IndexNotReady)?;

        // embedding query
        let start = Instant::now();
        let vector = self
            .embedder
            .embed(text, true)
            .await
            .map_err(QueryError::EmbeddingFailure)?;
        ensure_finite(&vector).map_err(QueryError::EmbeddingFailure)?;
        if let Some(dim) = index.dim().filter(|dim| *dim != vector.len()) {
            return Err(QueryError::EmbeddingFailure(anyhow::anyhow!(
                "query dimension {} differs from index dimension {}",
                vector.len(),
                dim
            )));
        }
        info!(
            "embedding query with {} spends {}s",
            self.embedder.name(),
            start.elapsed().as_secs_f64()
        );

        // match
        let start = Instant::now();
        let position = project_to_plane(&vector);
        let matched = best_match(index.entries(), &vector);
        let best_similarity = matched.map_or(0.0, |m| m.similarity);
        if let Some(m) = matched {
            info!(
                "match spends {}s over {} entries, nearest: {:?} ({})",
                start.elapsed().as_secs_f64(),
                index.len(),
                index.entries()[m.index].text,
                m.similarity
            );
        } else {
            info!("index is empty, nothing to match against");
        }

        let assessment = self
            .assessor
            .summarize(text, best_similarity.clamp(0.0, 1.0))
            .await;

        Ok(QueryResult {
            position,
            best_similarity,
            novelty_score: novelty_score(best_similarity),
            title: assessment.title,
            description: assessment.description,
        })
    }
}
