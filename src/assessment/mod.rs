//! Turning a similarity score into a human readable verdict.
//!
//! A remote generator is optional enrichment. The local rule table in
//! [`fallback`] is always available and is what answers whenever the remote
//! side is missing, cooling down, or erroring.

pub mod fallback;
pub mod openai;

use crate::error::AssessError;
use async_trait::async_trait;
use serde::Serialize;

pub use self::fallback::FallbackAssessor;
pub use self::openai::OpenAiAssessor;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assessment {
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait Assessor: Send + Sync {
    /// Whether a call right now is expected to succeed.
    fn is_available(&self) -> bool;

    async fn summarize(&self, pitch: &str, similarity: f32) -> Result<Assessment, AssessError>;
}

/// Primary assessor when it reports itself available, local rule table
/// otherwise or when the primary fails.
pub struct TieredAssessor {
    primary: Option<Box<dyn Assessor>>,
    fallback: FallbackAssessor,
}

impl TieredAssessor {
    pub fn new(primary: Option<Box<dyn Assessor>>) -> Self {
        Self {
            primary,
            fallback: FallbackAssessor,
        }
    }

    pub fn local_only() -> Self {
        Self::new(None)
    }

    pub async fn summarize(&self, pitch: &str, similarity: f32) -> Assessment {
        if let Some(primary) = self.primary.as_ref().filter(|p| p.is_available()) {
            match primary.summarize(pitch, similarity).await {
                Ok(assessment) => return assessment,
                Err(e) => warn!("remote assessment failed, using rule table: {}", e),
            }
        } else {
            debug!("no remote assessor available, using rule table");
        }
        self.fallback.assess(similarity)
    }
}
