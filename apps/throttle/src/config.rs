use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::LocoAddress;

pub const DEFAULT_CONFIG_FILE: &str = "throttle.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub addresses: Vec<String>,
    pub request_timeout_ms: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://192.168.1.103".into(),
            addresses: vec!["3".into(), "7".into()],
            request_timeout_ms: 5000,
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    addresses: Option<Vec<String>>,
    request_timeout_ms: Option<u64>,
    log_level: Option<String>,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn locomotive_addresses(&self) -> anyhow::Result<Vec<LocoAddress>> {
        if self.addresses.is_empty() {
            bail!("no locomotive addresses configured");
        }
        self.addresses
            .iter()
            .map(|raw| {
                raw.parse::<LocoAddress>()
                    .with_context(|| format!("invalid locomotive address in configuration: '{raw}'"))
            })
            .collect()
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.server_url {
            self.server_url = v;
        }
        if let Some(v) = file.addresses {
            self.addresses = v;
        }
        if let Some(v) = file.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
    }
}

pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then environment overrides.
///
/// An explicitly requested file must exist; the default `throttle.toml` is optional.
pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file_cfg);
        }
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    if let Some(v) = env("THROTTLE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("THROTTLE_ADDRESSES") {
        settings.addresses = split_addresses(&v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_MS is not a number: '{v}'"))?;
    }

    if let Some(v) = env("APP__LOG_LEVEL") {
        settings.log_level = v;
    }

    Ok(settings)
}

fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
