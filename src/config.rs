use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedderKind {
    Local,
    OpenAi,
}

impl FromStr for EmbedderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "hash" => Ok(EmbedderKind::Local),
            "openai" => Ok(EmbedderKind::OpenAi),
            other => Err(anyhow::anyhow!("unknown embedder: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub corpus_path: Option<PathBuf>,
    pub embedder: EmbedderKind,
    pub embedding_model: String,
    pub chat_model: String,
    pub local_embedding_dim: usize,
    pub remote_assessment: bool,
}

impl Settings {
    /// Read settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let has_key = lookup("OPENAI_API_KEY").map_or(false, |k| !k.trim().is_empty());
        Ok(Settings {
            port: parse_or(&lookup, "PITCHMAP_PORT", 8080)?,
            corpus_path: lookup("CORPUS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            embedder: parse_or(&lookup, "EMBEDDER", EmbedderKind::Local)?,
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            chat_model: lookup("CHAT_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            local_embedding_dim: parse_or(&lookup, "LOCAL_EMBEDDING_DIM", 384)?,
            remote_assessment: parse_or(&lookup, "REMOTE_ASSESSMENT", has_key)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.embedder, EmbedderKind::Local);
        assert_eq!(s.local_embedding_dim, 384);
        assert!(s.corpus_path.is_none());
        assert!(!s.remote_assessment);
    }

    #[test]
    fn api_key_enables_remote_assessment() {
        let s = settings(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert!(s.remote_assessment);

        let s = settings(&[("OPENAI_API_KEY", "sk-test"), ("REMOTE_ASSESSMENT", "false")])
            .unwrap();
        assert!(!s.remote_assessment);
    }

    #[test]
    fn overrides() {
        let s = settings(&[
            ("PITCHMAP_PORT", "9000"),
            ("EMBEDDER", "OpenAI"),
            ("CORPUS_PATH", "/data/startups.csv"),
        ])
        .unwrap();
        assert_eq!(s.port, 9000);
        assert_eq!(s.embedder, EmbedderKind::OpenAi);
        assert_eq!(s.corpus_path, Some(PathBuf::from("/data/startups.csv")));
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(settings(&[("PITCHMAP_PORT", "eighty")]).is_err());
        assert!(settings(&[("EMBEDDER", "word2vec")]).is_err());
    }
}
