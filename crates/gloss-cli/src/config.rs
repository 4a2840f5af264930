//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `GLOSS_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `GLOSS_PROVIDER__API_KEY`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, Result};
use gloss_suggest::ChatCompletionsConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  pub store_path: PathBuf,
  pub provider:   ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
  pub base_url:     String,
  pub model:        String,
  #[serde(default)]
  pub api_key:      Option<String>,
  pub timeout_secs: u64,
}

impl ProviderConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  pub fn chat_completions(&self) -> ChatCompletionsConfig {
    ChatCompletionsConfig {
      base_url:    self.base_url.clone(),
      model:       self.model.clone(),
      api_key:     self.api_key.clone().filter(|k| !k.trim().is_empty()),
      temperature: 0.2,
    }
  }
}

impl CliConfig {
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder()
      .set_default("store_path", "~/.local/share/gloss/gloss.db")?
      .set_default("provider.base_url", "https://api.openai.com/v1")?
      .set_default("provider.model", "gpt-4o-mini")?
      .set_default("provider.timeout_secs", 30)?;

    builder = match path {
      Some(path) => builder.add_source(config::File::from(path)),
      None => builder.add_source(config::File::with_name("gloss").required(false)),
    };

    let mut cfg: CliConfig = builder
      .add_source(
        config::Environment::with_prefix("GLOSS")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;

    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
