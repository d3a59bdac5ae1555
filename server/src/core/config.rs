use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_tilde;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_DB_PATH, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    SQLITE_IN_MEMORY,
};

// =============================================================================
// File Configuration (JSON)
// =============================================================================

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
}

/// Listing configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingFileConfig {
    pub page_size: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<DatabaseFileConfig>,
    pub listing: Option<ListingFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of top-level keys this build does not understand
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn warn_unknown_fields(&self) {
        let unknown = self.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(
                fields = %unknown.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
        }

        if let Some(listing) = other.listing {
            let current = self.listing.get_or_insert_with(ListingFileConfig::default);
            if listing.page_size.is_some() {
                tracing::trace!(page_size = ?listing.page_size, "Merging listing.page_size");
                current.page_size = listing.page_size;
            }
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingConfig {
    pub page_size: u32,
}

/// Final merged application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub listing: ListingConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.jogtrack/jogtrack.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_tilde(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(file_config, cli)
    }

    /// Layer defaults, merged file config and CLI/env overrides
    fn from_layers(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_database = file_config.database.unwrap_or_default();
        let file_listing = file_config.listing.unwrap_or_default();

        let path = cli
            .db
            .clone()
            .or(file_database.path)
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let path = if path == SQLITE_IN_MEMORY {
            path
        } else {
            expand_tilde(&path).to_string_lossy().into_owned()
        };

        let page_size = cli
            .page_size
            .or(file_listing.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let config = Self {
            database: DatabaseConfig { path },
            listing: ListingConfig { page_size },
        };
        config.validate()?;

        tracing::debug!(
            db = %config.database.path,
            page_size = config.listing.page_size,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            anyhow::bail!("Configuration error: database.path must not be empty");
        }

        if self.listing.page_size == 0 || self.listing.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "Configuration error: listing.page_size must be between 1 and {} (got {})",
                MAX_PAGE_SIZE,
                self.listing.page_size
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.jogtrack/jogtrack.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "database": { "path": "/var/lib/jogtrack.db" },
            "listing": { "page_size": 20 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.database.as_ref().unwrap().path,
            Some("/var/lib/jogtrack.db".to_string())
        );
        assert_eq!(config.listing.as_ref().unwrap().page_size, Some(20));
        assert!(config.unknown_fields().is_empty());
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.database.is_none());
        assert!(config.listing.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "database": { "path": "x.db" }, "databse": {}, "pagesize": 5 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let mut unknown = config.unknown_fields();
        unknown.sort();
        assert_eq!(unknown, vec!["databse", "pagesize"]);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig =
            serde_json::from_str(r#"{ "database": { "path": "a.db" }, "listing": { "page_size": 10 } }"#)
                .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "listing": { "page_size": 25 } }"#).unwrap();
        base.merge(overlay);

        assert_eq!(base.database.unwrap().path, Some("a.db".to_string()));
        assert_eq!(base.listing.unwrap().page_size, Some(25));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_layers(FileConfig::default(), &CliConfig::default()).unwrap();
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert_eq!(config.listing.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_app_config_cli_override() {
        let file_config: FileConfig =
            serde_json::from_str(r#"{ "database": { "path": "file.db" }, "listing": { "page_size": 10 } }"#)
                .unwrap();
        let cli = CliConfig {
            db: Some(SQLITE_IN_MEMORY.to_string()),
            page_size: Some(5),
            config: None,
        };
        let config = AppConfig::from_layers(file_config, &cli).unwrap();
        assert_eq!(config.database.path, SQLITE_IN_MEMORY);
        assert_eq!(config.listing.page_size, 5);
    }

    #[test]
    fn test_app_config_validation_page_size() {
        for page_size in [0, MAX_PAGE_SIZE + 1] {
            let cli = CliConfig {
                page_size: Some(page_size),
                ..Default::default()
            };
            let err = AppConfig::from_layers(FileConfig::default(), &cli).unwrap_err();
            assert!(err.to_string().contains("listing.page_size"));
        }
    }

    #[test]
    fn test_app_config_validation_empty_db_path() {
        let cli = CliConfig {
            db: Some("  ".to_string()),
            ..Default::default()
        };
        let err = AppConfig::from_layers(FileConfig::default(), &cli).unwrap_err();
        assert!(err.to_string().contains("database.path"));
    }

    #[test]
    fn test_load_from_cli_config_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "listing": {{ "page_size": 7 }} }}"#).unwrap();

        let cli = CliConfig {
            db: Some(SQLITE_IN_MEMORY.to_string()),
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.listing.page_size, 7);
    }

    #[test]
    fn test_load_missing_config_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = CliConfig {
            config: Some(dir.path().join("missing.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
