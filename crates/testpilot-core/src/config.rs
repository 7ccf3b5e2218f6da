use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ai::DEFAULT_OLLAMA_URL;
use crate::provider::Provider;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub claude_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Where an API key was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    Config,
    /// Provider needs no key
    Local,
}

impl KeySource {
    pub fn label(&self) -> &'static str {
        match self {
            KeySource::Env => "env var",
            KeySource::Config => "configured",
            KeySource::Local => "local",
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Ollama.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Load the user's config, falling back to defaults when none exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn save_default_model(model: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.default_model = Some(model.to_string());
        config.save()
    }

    /// Persist a provider choice together with the model picked for it
    pub fn save_provider(provider: Provider, model: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.provider = Some(provider.as_str().to_string());
        config.default_model = Some(model.to_string());
        config.save()
    }

    /// Directory holding config.json and the log file
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("testpilot"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Configured provider; unknown names fall back to Ollama
    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(Provider::Ollama)
    }

    pub fn model_for(&self, provider: Provider) -> String {
        match (&self.default_model, self.provider() == provider) {
            (Some(model), true) => model.clone(),
            _ => provider.default_model().to_string(),
        }
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// API key for a provider: environment first, then the config file
    pub fn api_key(&self, provider: Provider) -> Option<(String, KeySource)> {
        let stored = match provider {
            Provider::Ollama => return Some((String::new(), KeySource::Local)),
            Provider::Claude => self.claude_api_key.as_ref(),
            Provider::OpenAI => self.openai_api_key.as_ref(),
        };

        let from_env = provider
            .api_key_var()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty());

        match (from_env, stored) {
            (Some(key), _) => Some((key, KeySource::Env)),
            (None, Some(key)) if !key.trim().is_empty() => Some((key.clone(), KeySource::Config)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.provider(), Provider::Ollama);
        assert_eq!(config.ollama_url(), DEFAULT_OLLAMA_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            provider: Some("openai".to_string()),
            default_model: Some("gpt-4o".to_string()),
            request_timeout_secs: Some(30),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.provider(), Provider::OpenAI);
        assert_eq!(loaded.model_for(Provider::OpenAI), "gpt-4o");
        assert_eq!(loaded.model_for(Provider::Claude), Provider::Claude.default_model());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = Config::new();
        let (_, source) = config.api_key(Provider::Ollama).unwrap();
        assert_eq!(source, KeySource::Local);
    }
}
