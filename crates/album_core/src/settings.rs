use std::{fs, io, num::NonZeroUsize, path::Path, time::Duration};

use anyhow::Context;
use url::Url;

use crate::{album::DEFAULT_BATCH_LIMIT, pipeline::FetchMode};

pub const SETTINGS_FILE: &str = "album_browser.toml";
pub const DEFAULT_CATALOG_URL: &str = "https://jsonplaceholder.typicode.com/photos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub catalog_url: Url,
    pub batch_limit: usize,
    pub concurrent: bool,
    /// Only meaningful when `concurrent` is set; `None` is unbounded.
    pub max_in_flight: Option<NonZeroUsize>,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            concurrent: false,
            max_in_flight: None,
            request_timeout: Duration::from_secs(15),
        }
    }
}

fn default_catalog_url() -> Url {
    Url::parse(DEFAULT_CATALOG_URL).expect("default catalog url is valid")
}

impl Settings {
    pub fn fetch_mode(&self) -> FetchMode {
        if self.concurrent {
            FetchMode::Concurrent {
                max_in_flight: self.max_in_flight,
            }
        } else {
            FetchMode::Sequential
        }
    }

    /// Applies one `key = value` setting. Unknown keys and unparsable values
    /// are ignored with a warning.
    pub fn apply(&mut self, key: &str, raw: &str) {
        let raw = raw.trim();
        let applied = match key {
            "catalog_url" => Url::parse(raw).map(|url| self.catalog_url = url).is_ok(),
            "batch_limit" => raw
                .parse::<usize>()
                .map(|limit| self.batch_limit = limit)
                .is_ok(),
            "fetch_mode" => match raw.to_ascii_lowercase().as_str() {
                "sequential" => {
                    self.concurrent = false;
                    true
                }
                "concurrent" => {
                    self.concurrent = true;
                    true
                }
                _ => false,
            },
            // 0 lifts the bound.
            "max_in_flight" => raw
                .parse::<usize>()
                .map(|limit| self.max_in_flight = NonZeroUsize::new(limit))
                .is_ok(),
            "request_timeout_ms" => raw
                .parse::<u64>()
                .map(|ms| self.request_timeout = Duration::from_millis(ms))
                .is_ok(),
            _ => {
                tracing::warn!(key, "unknown setting ignored");
                return;
            }
        };
        if !applied {
            tracing::warn!(key, value = raw, "invalid setting value ignored");
        }
    }
}

const ENV_KEYS: &[(&str, &str)] = &[
    ("APP__CATALOG_URL", "catalog_url"),
    ("APP__BATCH_LIMIT", "batch_limit"),
    ("APP__FETCH_MODE", "fetch_mode"),
    ("APP__MAX_IN_FLIGHT", "max_in_flight"),
    ("APP__REQUEST_TIMEOUT_MS", "request_timeout_ms"),
];

/// Defaults, then [`SETTINGS_FILE`] in the working directory, then `APP__*`
/// environment variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let table: toml::Table = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            for (key, value) in &table {
                match value {
                    toml::Value::String(text) => settings.apply(key, text),
                    other => settings.apply(key, &other.to_string()),
                }
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
    }

    for &(var, key) in ENV_KEYS {
        if let Some(value) = env(var) {
            settings.apply(key, &value);
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
