//! Embedder doubles shared by the index and query tests.

use super::{Embedder, HashEmbedder};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps [`HashEmbedder`], counts calls, and fails any text containing
/// `fail_marker`.
pub struct ScriptedEmbedder {
    inner: HashEmbedder,
    calls: Arc<AtomicUsize>,
    fail_marker: Option<String>,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashEmbedder::default(),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_marker: None,
        }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn embed(&self, text: &str, normalize: bool) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                anyhow::bail!("embedding service timed out");
            }
        }
        self.inner.embed(text, normalize).await
    }
}

/// Always returns the same fixed vector, whatever the text.
pub struct ConstantEmbedder(pub Vec<f32>);

#[async_trait]
impl Embedder for ConstantEmbedder {
    fn name(&self) -> &str {
        "constant"
    }

    async fn embed(&self, _text: &str, _normalize: bool) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }
}
