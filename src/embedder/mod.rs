//! Text to vector collaborators.

pub mod hash;
pub mod openai;

use crate::progress::ProgressReporter;
use anyhow::Result;
use async_trait::async_trait;

pub use self::hash::HashEmbedder;
pub use self::openai::OpenAiEmbedder;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short identifier logged alongside timings.
    fn name(&self) -> &str;

    /// One-time preparation before the first `embed` call. Implementations
    /// report completion fractions through `progress`; the default has
    /// nothing to load.
    async fn warm_up(&self, progress: &ProgressReporter) -> Result<()> {
        progress.loading(1.0);
        Ok(())
    }

    /// Embed `text`. With `normalize` set the result has unit length
    /// (or is all zeros when the text carries no signal).
    async fn embed(&self, text: &str, normalize: bool) -> Result<Vec<f32>>;
}

#[cfg(test)]
pub mod testing;
