//! Local bag-of-words embedder based on feature hashing.
//!
//! Every content word is hashed into one of `dim` buckets. Texts that share
//! vocabulary end up with overlapping buckets, which is enough signal for a
//! small reference corpus and needs neither a network nor model weights.

use super::Embedder;
use crate::knowledge::normalize;
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is",
        "it", "its", "of", "on", "or", "that", "the", "their", "this", "to", "with", "your",
        "our", "we", "you", "who", "which", "app", "platform",
    ]
    .into_iter()
    .collect();
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(2) }
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token.bytes().fold(FNV_OFFSET, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
        });
        (hash % self.dim as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

/// Lowercased content words with a naive plural strip ("dogs" -> "dog").
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .map(|w| {
            if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
                w[..w.len() - 1].to_string()
            } else {
                w
            }
        })
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "local-hash"
    }

    async fn embed(&self, text: &str, normalize_output: bool) -> Result<Vec<f32>> {
        let mut vector = vec![0f32; self.dim];
        for token in tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }
        if normalize_output {
            normalize(&mut vector);
        }
        Ok(vector)
    }
}
