use super::{Assessment, Assessor};
use crate::error::AssessError;
use async_trait::async_trait;

pub const SATURATED_ABOVE: f32 = 0.8;
pub const INNOVATIVE_BELOW: f32 = 0.4;

/// Deterministic verdicts banded on similarity alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackAssessor;

impl FallbackAssessor {
    pub fn assess(&self, similarity: f32) -> Assessment {
        let percent = (similarity.clamp(0.0, 1.0) * 100.0).round();
        if similarity > SATURATED_ABOVE {
            Assessment {
                title: "Highly Saturated".to_string(),
                description: format!(
                    "This idea overlaps {}% with an existing venture. Expect direct \
                     competition and look for a sharper angle before building.",
                    percent
                ),
            }
        } else if similarity < INNOVATIVE_BELOW {
            Assessment {
                title: "High Innovation Area".to_string(),
                description: format!(
                    "Nothing in the reference set comes close (best match {}%). \
                     This looks like a distinctive space worth validating.",
                    percent
                ),
            }
        } else {
            Assessment {
                title: "Moderate Novelty".to_string(),
                description: format!(
                    "Related ideas exist (best match {}%), but there is room to \
                     differentiate on audience, model, or execution.",
                    percent
                ),
            }
        }
    }
}

#[async_trait]
impl Assessor for FallbackAssessor {
    fn is_available(&self) -> bool {
        true
    }

    async fn summarize(&self, _pitch: &str, similarity: f32) -> Result<Assessment, AssessError> {
        Ok(self.assess(similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_bands() {
        let assessor = FallbackAssessor;
        assert_eq!(assessor.assess(0.9).title, "Highly Saturated");
        assert_eq!(assessor.assess(0.1).title, "High Innovation Area");
        assert_eq!(assessor.assess(0.6).title, "Moderate Novelty");
    }

    #[test]
    fn band_edges_are_moderate() {
        let assessor = FallbackAssessor;
        assert_eq!(assessor.assess(0.8).title, "Moderate Novelty");
        assert_eq!(assessor.assess(0.4).title, "Moderate Novelty");
    }

    #[test]
    fn description_mentions_percentage() {
        let verdict = FallbackAssessor.assess(0.93);
        assert!(verdict.description.contains("93%"));
    }

    #[tokio::test]
    async fn usable_as_an_assessor() {
        let assessor: &dyn Assessor = &FallbackAssessor;
        assert!(assessor.is_available());
        let verdict = assessor.summarize("any pitch", 0.95).await.unwrap();
        assert_eq!(verdict.title, "Highly Saturated");
    }
}
