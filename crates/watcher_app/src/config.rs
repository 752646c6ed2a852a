use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogDestination;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] io::Error),
    #[error("could not parse config file: {0}")]
    Parse(String),
}

/// Everything the driver needs for one cycle. Replaces what used to be
/// hard-wired recipient and site constants with an explicit struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Listing page to watch; `?page={n}` is appended per page.
    pub base_url: String,
    /// CSS selector matching the document anchors on a listing page.
    pub link_selector: String,
    /// How many listing pages to walk each cycle.
    pub page_count: usize,
    /// Where the durable link snapshot lives.
    pub state_path: PathBuf,
    /// Notification endpoint. When absent, new links are only logged.
    pub webhook_url: Option<String>,
    pub subject: String,
    /// Commit new links without notifying. Useful for seeding the store.
    pub skip_notification: bool,
    pub log_destination: LogDestination,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open.canada.ca/en/search/ati".to_string(),
            link_selector: "div.col-sm-8 h4.mrgn-tp-0 a".to_string(),
            page_count: 2,
            state_path: PathBuf::from("watcher_state.ron"),
            webhook_url: None,
            subject: "New documents uploaded on Open Canada".to_string(),
            skip_notification: false,
            log_destination: LogDestination::Terminal,
        }
    }
}

/// Where the effective configuration came from, so the driver can log it
/// after the logger is up.
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: WatcherConfig,
    pub source: ConfigSource,
}

/// Loads the RON config at `path`. A missing file falls back to defaults;
/// a file that exists but does not parse is a startup error, never silently
/// replaced.
pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(LoadedConfig {
                config: WatcherConfig::default(),
                source: ConfigSource::Defaults,
            });
        }
        Err(err) => return Err(ConfigError::Io(err)),
    };

    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?;
    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = load(&temp.path().join("nope.ron")).unwrap();
        assert!(matches!(loaded.source, ConfigSource::Defaults));
        assert_eq!(loaded.config.page_count, 2);
        assert!(loaded.config.webhook_url.is_none());
    }

    #[test]
    fn full_config_file_is_parsed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("watcher.ron");
        fs::write(
            &path,
            r#"(
                base_url: "https://example.org/docs",
                link_selector: "ul.docs a",
                page_count: 5,
                state_path: "/var/lib/watcher/state.ron",
                webhook_url: Some("https://hooks.example.org/new-docs"),
                subject: "Fresh documents",
                skip_notification: true,
                log_destination: Both,
            )"#,
        )
        .unwrap();

        let loaded = load(&path).unwrap();
        assert!(matches!(loaded.source, ConfigSource::File(_)));
        let config = loaded.config;
        assert_eq!(config.base_url, "https://example.org/docs");
        assert_eq!(config.link_selector, "ul.docs a");
        assert_eq!(config.page_count, 5);
        assert_eq!(config.state_path, PathBuf::from("/var/lib/watcher/state.ron"));
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.org/new-docs")
        );
        assert_eq!(config.subject, "Fresh documents");
        assert!(config.skip_notification);
        assert_eq!(config.log_destination, LogDestination::Both);
    }

    #[test]
    fn partial_config_file_keeps_defaults_for_the_rest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("watcher.ron");
        fs::write(&path, r#"( page_count: 7 )"#).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.config.page_count, 7);
        assert_eq!(
            loaded.config.base_url,
            "https://open.canada.ca/en/search/ati"
        );
    }

    #[test]
    fn malformed_config_file_is_a_startup_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("watcher.ron");
        fs::write(&path, "( page_count: \"seven\" )").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
