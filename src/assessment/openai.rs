use super::{Assessment, Assessor};
use crate::error::AssessError;
use async_openai::types::{
    ChatCompletionRequestMessageArgs, CreateChatCompletionRequestArgs, Role,
};
use async_openai::Client;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How long the remote side is skipped after a failed call.
const COOLDOWN: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are a startup analyst. Given a pitch and how similar it is \
to the closest existing startup, reply with JSON only: \
{\"title\": <three to five word verdict>, \"description\": <two sentences of advice>}.";

#[derive(Deserialize)]
struct Verdict {
    title: String,
    description: String,
}

pub struct OpenAiAssessor {
    client: Client,
    model: String,
    cooling_until: Mutex<Option<Instant>>,
}

impl OpenAiAssessor {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            cooling_until: Mutex::new(None),
        }
    }

    fn trip(&self) {
        let mut until = self
            .cooling_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *until = Some(Instant::now() + COOLDOWN);
    }

    async fn request(&self, pitch: &str, similarity: f32) -> anyhow::Result<Assessment> {
        let request = CreateChatCompletionRequestArgs::default()
            .max_tokens(300u16)
            .model(self.model.as_str())
            .temperature(0.7)
            .messages([
                ChatCompletionRequestMessageArgs::default()
                    .role(Role::System)
                    .content(SYSTEM_PROMPT)
                    .build()?,
                ChatCompletionRequestMessageArgs::default()
                    .role(Role::User)
                    .content(format!(
                        "Pitch: {}\nSimilarity to closest existing startup: {:.0}%",
                        pitch,
                        similarity * 100.0
                    ))
                    .build()?,
            ])
            .build()?;

        let start = Instant::now();
        let response = self.client.chat().create(request).await?;
        info!(
            "assessment from {} spends {}s",
            self.model,
            start.elapsed().as_secs_f64()
        );
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("completion carried no choices"))?;
        parse_verdict(&content)
    }
}

/// Pull the first JSON object out of a completion; models like to wrap it.
fn parse_verdict(content: &str) -> anyhow::Result<Assessment> {
    let start = content
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("no JSON object in completion"))?;
    let end = content
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| anyhow::anyhow!("unterminated JSON object in completion"))?;
    let verdict: Verdict = serde_json::from_str(&content[start..=end])?;
    if verdict.title.trim().is_empty() {
        anyhow::bail!("completion returned an empty title");
    }
    Ok(Assessment {
        title: verdict.title.trim().to_string(),
        description: verdict.description.trim().to_string(),
    })
}

#[async_trait]
impl Assessor for OpenAiAssessor {
    fn is_available(&self) -> bool {
        let until = self
            .cooling_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        until.map_or(true, |t| Instant::now() >= t)
    }

    async fn summarize(&self, pitch: &str, similarity: f32) -> Result<Assessment, AssessError> {
        match self.request(pitch, similarity).await {
            Ok(assessment) => Ok(assessment),
            Err(e) => {
                self.trip();
                Err(AssessError::Unavailable(e.to_string()))
            }
        }
    }
}
