//! clubcal configuration.
//!
//! Read from `~/.config/clubcal/config.toml` (or `$CLUBCAL_CONFIG`), with
//! `CLUBCAL_*` environment variables layered on top, e.g.
//! `CLUBCAL_BACKEND__API_KEY`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ClubCalError, ClubCalResult};

const CONFIG_PATH_VAR: &str = "CLUBCAL_CONFIG";
const ENV_PREFIX: &str = "CLUBCAL";

/// What happens to earlier reports when another one is uploaded for the same event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPolicy {
    /// Keep every association; lookups return the first one recorded.
    #[default]
    Append,
    /// Keep only the newest association.
    Replace,
}

/// What happens to an event's reports when the event is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Leave associations and blobs behind.
    #[default]
    KeepReports,
    /// Delete the event's associations and their blobs too.
    Cascade,
}

/// Connection parameters for the hosted backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub api_key: String,

    /// Defaults to `<project_id>.appspot.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,
}

impl BackendConfig {
    pub fn bucket(&self) -> String {
        self.storage_bucket
            .clone()
            .unwrap_or_else(|| format!("{}.appspot.com", self.project_id))
    }

    pub fn validate(&self) -> ClubCalResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(ClubCalError::Config("backend.project_id is not set".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ClubCalError::Config("backend.api_key is not set".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubCalConfig {
    #[serde(default)]
    pub report_policy: ReportPolicy,

    #[serde(default)]
    pub delete_policy: DeletePolicy,

    #[serde(default)]
    pub backend: BackendConfig,
}

impl ClubCalConfig {
    pub fn config_path() -> ClubCalResult<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_PATH_VAR) {
            return Ok(PathBuf::from(shellexpand::tilde(&custom).into_owned()));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| ClubCalError::Config("Could not determine config directory".into()))?
            .join("clubcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented template first if needed.
    pub fn load() -> ClubCalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (which may be missing) plus the environment.
    pub fn load_from(path: &Path) -> ClubCalResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ClubCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ClubCalError::Config(e.to_string()))
    }

    pub fn from_toml_str(content: &str) -> ClubCalResult<Self> {
        toml::from_str(content).map_err(|e| ClubCalError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> ClubCalResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClubCalError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ClubCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ClubCalResult<()> {
        let contents = "\
# clubcal configuration

# Uploading another report for an event: \"append\" or \"replace\"
# report_policy = \"append\"

# Deleting an event: \"keep_reports\" or \"cascade\"
# delete_policy = \"keep_reports\"

# Top-level keys must stay above this table.
[backend]
# project_id = \"my-club\"
# api_key = \"...\"
# storage_bucket = \"my-club.appspot.com\"
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClubCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ClubCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClubCalConfig::from_toml_str("").unwrap();
        assert_eq!(config.report_policy, ReportPolicy::Append);
        assert_eq!(config.delete_policy, DeletePolicy::KeepReports);
        assert!(config.backend.validate().is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let config = ClubCalConfig::from_toml_str(
            r#"
report_policy = "replace"
delete_policy = "cascade"

[backend]
project_id = "chess-club"
api_key = "k-123"
"#,
        )
        .unwrap();

        assert_eq!(config.report_policy, ReportPolicy::Replace);
        assert_eq!(config.delete_policy, DeletePolicy::Cascade);
        assert_eq!(config.backend.bucket(), "chess-club.appspot.com");
        assert!(config.backend.validate().is_ok());
    }

    #[test]
    fn test_explicit_bucket_wins() {
        let backend = BackendConfig {
            project_id: "p".into(),
            api_key: "k".into(),
            storage_bucket: Some("custom-bucket".into()),
        };
        assert_eq!(backend.bucket(), "custom-bucket");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(ClubCalConfig::from_toml_str("report_policy = \"sometimes\"").is_err());
    }

    #[test]
    fn test_default_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        ClubCalConfig::create_default_config(&path).unwrap();
        let config = ClubCalConfig::load_from(&path).unwrap();

        assert_eq!(config.report_policy, ReportPolicy::Append);
        assert_eq!(config.backend.project_id, "");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ClubCalConfig {
            backend: BackendConfig {
                project_id: "drama".into(),
                api_key: "key".into(),
                storage_bucket: None,
            },
            report_policy: ReportPolicy::Replace,
            delete_policy: DeletePolicy::KeepReports,
        };

        config.save(&path).unwrap();
        let loaded = ClubCalConfig::load_from(&path).unwrap();

        assert_eq!(loaded.backend.project_id, "drama");
        assert_eq!(loaded.report_policy, ReportPolicy::Replace);
    }

    #[test]
    fn test_uncommented_default_file_applies_policies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        ClubCalConfig::create_default_config(&path).unwrap();

        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace("# report_policy = \"append\"", "report_policy = \"replace\"")
            .replace("# delete_policy = \"keep_reports\"", "delete_policy = \"cascade\"")
            .replace("# project_id = \"my-club\"", "project_id = \"my-club\"");
        std::fs::write(&path, edited).unwrap();

        let config = ClubCalConfig::load_from(&path).unwrap();
        assert_eq!(config.report_policy, ReportPolicy::Replace);
        assert_eq!(config.delete_policy, DeletePolicy::Cascade);
        assert_eq!(config.backend.project_id, "my-club");
    }
}
