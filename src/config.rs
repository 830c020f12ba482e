//! Application settings
//!
//! Resolved from, lowest to highest priority:
//! - built-in defaults
//! - `settings.json` in the user's config directory (or `--config <path>`)
//! - command-line flags and their environment variables
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;

const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";
const DEFAULT_MEDIA_BASE: &str = "http://127.0.0.1:5000/static/images";

/// Path under the service origin where matched images are served
const MEDIA_PATH: &str = "/static/images";

/// Command-line flags
#[derive(Debug, Default, Parser)]
#[command(name = "similar-search", version, about)]
pub struct CliArgs {
    /// Origin of the similarity-search service
    #[arg(long, env = "SIMILAR_SEARCH_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Base URL result images are served from
    #[arg(long, env = "SIMILAR_SEARCH_MEDIA_BASE")]
    pub media_base: Option<String>,

    /// Settings file to load instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Search with this image file, print the result URLs and exit
    #[arg(long, value_name = "IMAGE")]
    pub search: Option<PathBuf>,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: String,
    pub media_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            media_base: DEFAULT_MEDIA_BASE.to_string(),
        }
    }
}

/// Settings file contents; every field optional
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    service_url: Option<String>,
    media_base: Option<String>,
}

impl Settings {
    /// Resolve settings for this run
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Missing(path.clone()));
                }
                read_settings_file(path)?
            }
            None => match default_settings_path() {
                Some(path) if path.exists() => read_settings_file(&path)?,
                _ => SettingsFile::default(),
            },
        };

        let settings = Self::resolve(file, cli);
        settings.validate()?;
        info!(
            service_url = %settings.service_url,
            media_base = %settings.media_base,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Layer file values and CLI overrides over the defaults
    fn resolve(file: SettingsFile, cli: &CliArgs) -> Self {
        let service_url = cli.service_url.clone().or(file.service_url);
        let media_base = cli.media_base.clone().or(file.media_base);

        match (service_url, media_base) {
            (None, None) => Self::default(),
            (Some(service_url), None) => Self {
                media_base: derive_media_base(&service_url),
                service_url,
            },
            (service_url, Some(media_base)) => Self {
                service_url: service_url.unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
                media_base,
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_url("service", &self.service_url)?;
        check_url("media base", &self.media_base)
    }
}

/// Get the path of the default settings file
/// e.g. ~/.config/similar-search/settings.json on Linux
pub fn default_settings_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("similar-search");
    path.push("settings.json");
    Some(path)
}

fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    debug!(path = %path.display(), "reading settings file");

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn derive_media_base(service_url: &str) -> String {
    format!("{}{}", service_url.trim_end_matches('/'), MEDIA_PATH)
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}
