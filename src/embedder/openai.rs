use super::Embedder;
use crate::knowledge::normalize;
use crate::progress::ProgressReporter;
use anyhow::Result;
use async_openai::{types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use std::time::Instant;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tokio::sync::OnceCell;

/// Input window of the ada-002 family.
const MAX_INPUT_TOKENS: usize = 8191;

pub struct OpenAiEmbedder {
    client: Client,
    model: String,
    bpe: OnceCell<CoreBPE>,
}

impl OpenAiEmbedder {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            bpe: OnceCell::new(),
        }
    }

    async fn tokenizer(&self) -> Result<&CoreBPE> {
        self.bpe.get_or_try_init(|| async { cl100k_base() }).await
    }

    async fn truncate(&self, text: &str) -> Result<String> {
        let bpe = self.tokenizer().await?;
        let tokens = bpe.encode_with_special_tokens(text);
        if tokens.len() <= MAX_INPUT_TOKENS {
            return Ok(text.to_string());
        }
        debug!(
            "truncating input from {} to {} tokens",
            tokens.len(),
            MAX_INPUT_TOKENS
        );
        bpe.decode(tokens[..MAX_INPUT_TOKENS].to_vec())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn warm_up(&self, progress: &ProgressReporter) -> Result<()> {
        progress.loading(0.0);
        self.tokenizer().await?;
        progress.loading(0.5);

        // probe once so a bad key or model name shows up before ingestion
        let start = Instant::now();
        self.embed("warm up", false).await?;
        info!(
            "embedder {} reachable, probe spends {}s",
            self.model,
            start.elapsed().as_secs_f64()
        );
        progress.loading(1.0);
        Ok(())
    }

    async fn embed(&self, text: &str, normalize_output: bool) -> Result<Vec<f32>> {
        let input = self.truncate(text).await?;
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.as_str())
            .input(input)
            .build()?;
        let mut vector = self
            .client
            .embeddings()
            .create(request)
            .await?
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| anyhow::anyhow!("embedding response carried no data"))?;
        if normalize_output {
            normalize(&mut vector);
        }
        Ok(vector)
    }
}
