//! Configuration module for the metadata resolver.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CM_` and use double underscores
//! to separate nested levels:
//! - `CM_SOURCE__LOCALE=deDE` sets `source.locale`
//! - `CM_CACHE__BACKEND=memory` sets `cache.backend`
//! - `CM_HTTP__TIMEOUT_SECS=10` sets `http.timeout_secs`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{ResolverError, ResolverResult};

/// Name of the per-workspace configuration directory
pub const CONFIG_DIR: &str = ".cardmeta";

/// Name of the settings file inside [`CONFIG_DIR`]
pub const SETTINGS_FILE: &str = "settings.toml";

/// Public card metadata endpoint
pub const DEFAULT_SOURCE_TEMPLATE: &str =
    "https://api.hearthstonejson.com/v1/%(build)s/%(locale)s/cards.json";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .cardmeta is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Remote metadata source
    #[serde(default)]
    pub source: SourceConfig,

    /// Persistent cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    /// URL template containing `%(build)s` and `%(locale)s`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Locale substituted into the template
    #[serde(default = "default_locale")]
    pub locale: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// One file per build under `cache.dir`
    File,
    /// Process-local only
    Memory,
    /// No persistent storage
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    /// Cache directory; relative paths are resolved against the workspace root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when CARDMETA_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_locale() -> String {
    "enUS".to_string()
}
fn default_cache_backend() -> CacheBackend {
    CacheBackend::File
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("cardmeta/{}", env!("CARGO_PKG_VERSION"))
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            source: SourceConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            template: Some(DEFAULT_SOURCE_TEMPLATE.to_string()),
            locale: default_locale(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            dir: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> ResolverResult<Self> {
        // Try to find the workspace root by looking for .cardmeta directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(|e| ResolverError::config(e.to_string()))
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    ///
    /// The workspace root is taken from the file's location: the parent of
    /// its `.cardmeta` directory, or the directory holding the file.
    pub fn load_from(path: impl AsRef<Path>) -> ResolverResult<Self> {
        let path = path.as_ref();
        Self::figment(path)
            .extract()
            .map_err(|e| ResolverError::config(e.to_string()))
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root_of(path);
                }
                settings
            })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with CM_ prefix
            // Use double underscore (__) to separate nested levels
            // Single underscore (_) remains as is within field names
            .merge(Env::prefixed("CM_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".") // Double underscore becomes dot
                    .into()
            }))
    }

    /// Find the workspace config by looking for .cardmeta directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .cardmeta is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.exists() && config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    fn workspace_root_of(config_path: &Path) -> Option<PathBuf> {
        let parent = config_path.parent()?;
        let root = if parent.file_name() == Some(OsStr::new(CONFIG_DIR)) {
            parent.parent()?
        } else {
            parent
        };

        if root.as_os_str().is_empty() {
            std::env::current_dir().ok()
        } else {
            Some(root.to_path_buf())
        }
    }

    /// Directory used by the file cache backend.
    ///
    /// An explicit `cache.dir` wins (relative to the workspace root when one
    /// is known); otherwise `.cardmeta/cache` inside the workspace, falling
    /// back to the user cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        match (&self.cache.dir, &self.workspace_root) {
            (Some(dir), Some(root)) if dir.is_relative() => root.join(dir),
            (Some(dir), _) => dir.clone(),
            (None, Some(root)) => root.join(CONFIG_DIR).join("cache"),
            (None, None) => dirs::cache_dir()
                .map(|dir| dir.join("cardmeta"))
                .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("cache")),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> ResolverResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ResolverError::config(format!("{}: {e}", parent.display())))?;
        }

        let toml_string =
            toml::to_string_pretty(self).map_err(|e| ResolverError::config(e.to_string()))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ResolverError::config(format!("{}: {e}", path.display())))?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(dir: impl AsRef<Path>, force: bool) -> ResolverResult<PathBuf> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err(ResolverError::config(
                "Configuration file already exists. Use --force to overwrite",
            ));
        }

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ResolverError::config(format!("{}: {e}", parent.display())))?;
        }

        let template = format!(
            r#"# cardmeta Configuration File

# Version of the configuration schema
version = 1

[source]
# URL template for card metadata.
# %(build)s is replaced by the build number (or "latest"),
# %(locale)s by the locale below.
template = "{DEFAULT_SOURCE_TEMPLATE}"

# Locale code substituted into the template
locale = "enUS"

[cache]
# Where fetched catalogs are kept between runs: "file", "memory" or "none"
backend = "file"

# Cache directory (relative to the workspace root)
# dir = ".cardmeta/cache"

[http]
# Request timeout in seconds
timeout_secs = 30

# User-Agent header
# user_agent = "cardmeta/{}"

[logging]
# Default log filter when CARDMETA_LOG is unset (error, warn, info, debug, trace)
level = "warn"
"#,
            env!("CARGO_PKG_VERSION")
        );

        std::fs::write(&config_path, template)
            .map_err(|e| ResolverError::config(format!("{}: {e}", config_path.display())))?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(
            settings.source.template.as_deref(),
            Some(DEFAULT_SOURCE_TEMPLATE)
        );
        assert_eq!(settings.source.locale, "enUS");
        assert_eq!(settings.cache.backend, CacheBackend::File);
        assert_eq!(settings.http.timeout_secs, 30);
        assert!(settings.http.user_agent.starts_with("cardmeta/"));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[source]
template = "http://localhost/%(build)s/%(locale)s.json"
locale = "frFR"

[cache]
backend = "none"
dir = "/var/cache/cards"

[logging]
level = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(
            settings.source.template.as_deref(),
            Some("http://localhost/%(build)s/%(locale)s.json")
        );
        assert_eq!(settings.source.locale, "frFR");
        assert_eq!(settings.cache.backend, CacheBackend::Disabled);
        assert_eq!(settings.cache.dir, Some(PathBuf::from("/var/cache/cards")));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_load_from_workspace_file_anchors_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join(SETTINGS_FILE);

        fs::write(&config_path, "[source]\nlocale = \"deDE\"\n").unwrap();
        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.workspace_root.as_deref(), Some(temp_dir.path()));
        assert_eq!(
            settings.cache_dir(),
            temp_dir.path().join(CONFIG_DIR).join("cache")
        );

        fs::write(&config_path, "[cache]\ndir = \"store\"\n").unwrap();
        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.cache_dir(), temp_dir.path().join("store"));
    }

    #[test]
    fn test_load_from_plain_file_uses_its_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cardmeta.toml");
        fs::write(&config_path, "version = 1\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(
            settings.cache_dir(),
            temp_dir.path().join(CONFIG_DIR).join("cache")
        );
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.source.locale = "jaJP".to_string();
        settings.cache.backend = CacheBackend::Memory;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.source.locale, "jaJP");
        assert_eq!(loaded.cache.backend, CacheBackend::Memory);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        // Only specify a few settings
        let toml_content = r#"
[source]
locale = "deDE"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified values
        assert_eq!(settings.source.locale, "deDE");

        // Default values should still be present
        assert_eq!(settings.version, 1);
        assert_eq!(
            settings.source.template.as_deref(),
            Some(DEFAULT_SOURCE_TEMPLATE)
        );
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[http]\ntimeout_secs = 5\n").unwrap();

        unsafe {
            std::env::set_var("CM_HTTP__TIMEOUT_SECS", "12");
        }

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.http.timeout_secs, 12);

        unsafe {
            std::env::remove_var("CM_HTTP__TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_init_config_file_round_trips() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".cardmeta/settings.toml"));

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(
            settings.source.template.as_deref(),
            Some(DEFAULT_SOURCE_TEMPLATE)
        );
        assert_eq!(settings.cache.backend, CacheBackend::File);

        // Refuses to clobber without force
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_cache_dir_resolution() {
        let mut settings = Settings {
            workspace_root: Some(PathBuf::from("/work")),
            ..Settings::default()
        };
        assert_eq!(settings.cache_dir(), PathBuf::from("/work/.cardmeta/cache"));

        settings.cache.dir = Some(PathBuf::from("data/cards"));
        assert_eq!(settings.cache_dir(), PathBuf::from("/work/data/cards"));

        settings.cache.dir = Some(PathBuf::from("/abs/cards"));
        assert_eq!(settings.cache_dir(), PathBuf::from("/abs/cards"));
    }
}
