//! TOML configuration file for the `mindmate` binary.
//!
//! ```toml
//! [rag]
//! chunk_size = 1000
//! chunk_overlap = 200
//! top_k = 5
//!
//! [embedding]
//! provider = "hashing"
//! dimensions = 384
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mindmate_rag::{EmbeddingProvider, HashingEmbedder, RagConfig};
use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Hashing,
    Openai,
}

/// Which embedding provider to use and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Vector length. For `openai` this must match the model.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Model name (openai only)
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible server (openai only)
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_dimensions() -> usize {
    HashingEmbedder::DEFAULT_DIMENSIONS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            dimensions: default_dimensions(),
            model: None,
            base_url: None,
        }
    }
}

impl FileConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        Ok(config)
    }
}

impl EmbeddingConfig {
    /// Construct the configured provider.
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self.provider {
            ProviderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(self.dimensions))),
            ProviderKind::Openai => self.build_openai(),
        }
    }

    #[cfg(feature = "openai")]
    fn build_openai(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let mut provider = mindmate_rag::OpenAiEmbedder::from_env()?;
        if let Some(url) = &self.base_url {
            provider = provider.with_base_url(url.as_str());
        }
        if let Some(model) = &self.model {
            provider = provider.with_model(model.as_str(), self.dimensions);
        }
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "openai"))]
    fn build_openai(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        anyhow::bail!("the openai embedding provider requires building with `--features openai`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.rag, RagConfig::default());
        assert_eq!(config.embedding.provider, ProviderKind::Hashing);
        assert_eq!(config.embedding.dimensions, 384);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = FileConfig::parse(
            r#"
            [rag]
            top_k = 8
            chunk_size = 500
            chunk_overlap = 50

            [embedding]
            dimensions = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.rag.top_k, 8);
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.history_limit, 10);
        assert_eq!(config.embedding.dimensions, 64);
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindmate.toml");
        std::fs::write(&path, "[rag]\npreview_chars = 80\n").unwrap();
        assert_eq!(FileConfig::load(Some(&path)).unwrap().rag.preview_chars, 80);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(FileConfig::parse("[embedding]\nprovider = \"bert\"\n").is_err());
    }

    #[test]
    fn hashing_provider_uses_configured_dimensions() {
        let embedding = EmbeddingConfig { dimensions: 32, ..EmbeddingConfig::default() };
        assert_eq!(embedding.build().unwrap().dimensions(), 32);
    }
}
