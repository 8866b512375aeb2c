mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Used when neither `--config` nor `REAGENT_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pick the config file: explicit path, then `REAGENT_CONFIG`, then the default.
#[must_use]
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("REAGENT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

impl Config {
    /// Load configuration from a TOML file with env var overrides, then validate it.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be at least 1");
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            bail!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            );
        }
        if self.agent.max_iterations == 0 {
            bail!("agent.max_iterations must be at least 1");
        }

        let mut names = HashSet::new();
        let mut tools = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                bail!("collection name must not be empty");
            }
            if !names.insert(collection.name.as_str()) {
                bail!("duplicate collection name: {}", collection.name);
            }
            if collection.sources.is_empty() {
                bail!("collection {} has no sources", collection.name);
            }
            let mut sources = HashSet::new();
            if let Some(dup) = collection.sources.iter().find(|s| !sources.insert(*s)) {
                bail!(
                    "collection {} lists source {} twice",
                    collection.name,
                    dup.display()
                );
            }
            let tool = collection.tool_name();
            if tool.trim().is_empty() {
                bail!("collection {} has an empty tool name", collection.name);
            }
            if !tools.insert(tool.clone()) {
                bail!("duplicate tool name: {tool}");
            }
        }
        Ok(())
    }
}
