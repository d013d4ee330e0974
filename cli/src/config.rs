//! CLI configuration and store path resolution

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "~/.foresight/config.toml";
const DEFAULT_STORE_PATH: &str = "~/.foresight/market.json";
const DEFAULT_OWNER: &str = "owner";

/// On-disk configuration (`~/.foresight/config.toml`), all fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Path to the market store journal.
    pub store: Option<String>,

    /// Identity allowed to resolve questions.
    pub owner: Option<String>,
}

/// Effective configuration after merging flags over the config file.
#[derive(Debug)]
pub struct CliConfig {
    pub store_path: PathBuf,
    pub owner: String,
}

impl CliConfig {
    pub fn load(
        config_path: Option<PathBuf>,
        store_override: Option<PathBuf>,
        owner_override: Option<String>,
    ) -> Result<Self> {
        let config_path = config_path
            .unwrap_or_else(|| PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref()));

        let file_config = if config_path.exists() {
            let data = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config file: {}", config_path.display()))?;
            toml::from_str::<FileConfig>(&data)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?
        } else {
            FileConfig::default()
        };

        let store_path = store_override.unwrap_or_else(|| {
            let raw = file_config.store.as_deref().unwrap_or(DEFAULT_STORE_PATH);
            PathBuf::from(shellexpand::tilde(raw).as_ref())
        });

        let owner = owner_override
            .or(file_config.owner)
            .unwrap_or_else(|| DEFAULT_OWNER.to_string());

        Ok(Self { store_path, owner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_config_file() {
        let config =
            CliConfig::load(Some(PathBuf::from("/nonexistent/config.toml")), None, None).unwrap();
        assert_eq!(config.owner, "owner");
        assert!(config.store_path.ends_with("market.json"));
    }

    #[test]
    fn file_values_and_overrides_merge() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = fs::File::create(&config_path).unwrap();
        writeln!(file, "store = \"/tmp/custom.json\"\nowner = \"alice\"").unwrap();

        let config = CliConfig::load(Some(config_path.clone()), None, None).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/custom.json"));
        assert_eq!(config.owner, "alice");

        let config = CliConfig::load(
            Some(config_path),
            Some(PathBuf::from("/tmp/other.json")),
            Some("bob".to_string()),
        )
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/other.json"));
        assert_eq!(config.owner, "bob");
    }
}
