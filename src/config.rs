use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_API_URL: &str = "ORGDASH_API_URL";
pub const ENV_TOKEN: &str = "ORGDASH_TOKEN";

const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Longest rolling activity window, in days.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Keys accepted by `config get/set`.
pub const KEYS: &[&str] = &[
    "api_url",
    "token",
    "timeout_secs",
    "cache_ttl_secs",
    "activity_limit",
    "window_days",
];

/// Client and aggregation settings, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Lifetime of a cached analytics snapshot.
    pub cache_ttl_secs: u64,
    /// How many entries to request from the recent-activity feed.
    pub activity_limit: u32,
    /// Length of the rolling activity series in days.
    pub window_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            activity_limit: 10,
            window_days: 7,
        }
    }
}

impl Config {
    /// Default config location (`~/.orgdash/config.json`).
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".orgdash");
        Ok(dir.join("config.json"))
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Self::default_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        check_window_days(self.window_days)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Environment variables win over file values.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.trim().is_empty() {
                self.token = Some(token);
            }
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api_url" => Some(self.api_url.clone()),
            "token" => self.token.clone(),
            "timeout_secs" => Some(self.timeout_secs.to_string()),
            "cache_ttl_secs" => Some(self.cache_ttl_secs.to_string()),
            "activity_limit" => Some(self.activity_limit.to_string()),
            "window_days" => Some(self.window_days.to_string()),
            other => return Err(unknown_key(other)),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => {
                url::Url::parse(value)?;
                self.api_url = value.to_string();
            }
            "token" => {
                self.token = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "timeout_secs" => self.timeout_secs = parse_number(key, value)?,
            "cache_ttl_secs" => self.cache_ttl_secs = parse_number(key, value)?,
            "activity_limit" => self.activity_limit = parse_number(key, value)?,
            "window_days" => {
                let days = parse_number(key, value)?;
                check_window_days(days)?;
                self.window_days = days;
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    /// All set keys with their values. The token is masked.
    pub fn entries(&self) -> Vec<(String, String)> {
        KEYS.iter()
            .filter_map(|key| {
                let value = self.get(key).ok().flatten()?;
                let shown = if *key == "token" {
                    mask_secret(&value)
                } else {
                    value
                };
                Some((key.to_string(), shown))
            })
            .collect()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}

fn check_window_days(days: u32) -> Result<()> {
    if days > MAX_WINDOW_DAYS {
        return Err(Error::Config(format!(
            "window_days must be at most {MAX_WINDOW_DAYS}, got {days}"
        )));
    }
    Ok(())
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!("unknown key '{key}'. Valid keys: {}", KEYS.join(", ")))
}

fn mask_secret(s: &str) -> String {
    let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}
