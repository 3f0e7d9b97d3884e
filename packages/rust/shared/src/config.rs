//! Application configuration for DealDesk.
//!
//! User config lives at `~/.dealdesk/dealdesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DealDeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "dealdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".dealdesk";

/// Database file created inside `[store] data_dir`.
pub const DATABASE_FILE_NAME: &str = "dealdesk.db";

// ---------------------------------------------------------------------------
// Config structs (matching dealdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Persistent store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Pipeline transition rules.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Campaign/list binding rules.
    #[serde(default)]
    pub campaigns: CampaignsConfig,
}

/// Which slot backend the store writes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackendKind {
    /// libSQL database file under `data_dir`.
    #[default]
    File,
    /// Process memory only; nothing survives the session.
    Memory,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackendKind,

    /// Directory holding the store database. `~` expands to the home directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Prefix applied to every slot key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::default(),
            data_dir: default_data_dir(),
            namespace: default_namespace(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.dealdesk/data".into()
}
fn default_namespace() -> String {
    "dealdesk".into()
}

impl StoreConfig {
    /// `data_dir` with a leading `~` expanded.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        expand_home(&self.data_dir)
    }

    /// Path of the database file used by the `file` backend.
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.resolved_data_dir()?.join(DATABASE_FILE_NAME))
    }
}

/// Which stage moves `move_contact` accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionPolicy {
    /// Only `stage[i] -> stage[i+1]`.
    #[default]
    ForwardOnly,
    /// Any canonical stage, including backwards.
    Arbitrary,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub transitions: TransitionPolicy,
}

/// What happens when a campaign claims a list another campaign holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListBindingPolicy {
    /// Fail with a conflict error.
    #[default]
    Reject,
    /// Move the list to the new campaign and release the old holder.
    LastWriteWins,
}

/// `[campaigns]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignsConfig {
    #[serde(default)]
    pub list_binding: ListBindingPolicy,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// `~/.dealdesk/`.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DealDeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// `~/.dealdesk/dealdesk.toml`.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Read the user's config file, or defaults when none has been written yet.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Parse a config file at an explicit location.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DealDeskError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DealDeskError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write the default config to `~/.dealdesk/dealdesk.toml`, overwriting any
/// existing file, and return where it went.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DealDeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DealDeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DealDeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

fn expand_home(raw: &str) -> Result<PathBuf> {
    match raw.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| DealDeskError::config("could not determine home directory"))?;
            Ok(home.join(rest.trim_start_matches(['/', '\\'])))
        }
        None => Ok(PathBuf::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_every_section() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("forward-only"));
        assert!(toml_str.contains("reject"));
    }

    #[test]
    fn defaults_survive_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.store.backend, StoreBackendKind::File);
        assert_eq!(parsed.store.namespace, "dealdesk");
        assert_eq!(parsed.campaigns.list_binding, ListBindingPolicy::Reject);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[store]
backend = "memory"

[campaigns]
list_binding = "last-write-wins"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.store.backend, StoreBackendKind::Memory);
        assert_eq!(config.store.data_dir, "~/.dealdesk/data");
        assert_eq!(config.campaigns.list_binding, ListBindingPolicy::LastWriteWins);
        assert_eq!(config.pipeline.transitions, TransitionPolicy::ForwardOnly);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let toml_str = r#"
[pipeline]
transitions = "sideways"
"#;
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn database_lives_in_data_dir() {
        let store = StoreConfig {
            data_dir: "/srv/dealdesk".into(),
            ..StoreConfig::default()
        };
        assert_eq!(
            store.database_path().expect("absolute path"),
            PathBuf::from("/srv/dealdesk").join(DATABASE_FILE_NAME)
        );
    }

    #[test]
    fn data_dir_expands_home() {
        let store = StoreConfig {
            data_dir: "/var/lib/dealdesk".into(),
            ..StoreConfig::default()
        };
        assert_eq!(
            store.resolved_data_dir().expect("absolute path"),
            PathBuf::from("/var/lib/dealdesk")
        );

        if let Some(home) = dirs::home_dir() {
            let resolved = StoreConfig::default().resolved_data_dir().expect("home path");
            assert_eq!(resolved, home.join(".dealdesk/data"));
        }
    }
}
