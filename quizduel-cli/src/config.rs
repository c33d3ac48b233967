use quizduel_core::{GameConfig, QuizduelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults for the command line flags, read from `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub display_name: String,
    pub rounds: u32,
    pub category: String,
    pub listen_addr: String,
    pub bank_path: Option<PathBuf>,
    pub tick_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            display_name: "Player".to_string(),
            rounds: 10,
            category: GameConfig::ALL_CATEGORIES.to_string(),
            listen_addr: "0.0.0.0:7878".to_string(),
            bank_path: None,
            tick_ms: 1000,
        }
    }
}

impl CliConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizduel")
            .join("config.json")
    }

    /// Missing file means defaults; a file that does not parse is an error
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            QuizduelError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("config.json")).await.unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"display_name":"Ana","rounds":3}"#).unwrap();

        let config = CliConfig::load(&path).await.unwrap();
        assert_eq!(config.display_name, "Ana");
        assert_eq!(config.rounds, 3);
        assert_eq!(config.category, "all");
        assert_eq!(config.tick_ms, 1000);
    }

    #[tokio::test]
    async fn test_broken_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ rounds: ").unwrap();

        assert!(matches!(
            CliConfig::load(&path).await,
            Err(QuizduelError::Config(_))
        ));
    }
}
