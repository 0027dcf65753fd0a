//! User configuration loaded from `config.toml`.
//!
//! Every key is optional. A missing file yields the defaults; a malformed file
//! also yields the defaults plus a warning the caller logs once the subscriber
//! is up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Environment variable that overrides `database_path`.
pub const DB_ENV: &str = "RECIPO_DB";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `"dark"` or `"catppuccin-mocha"`.
    pub theme: String,
    pub database_path: PathBuf,
    /// Upper bound on a single like/comment round trip.
    pub gateway_timeout_ms: u64,
    /// Directory the mail worker writes `.eml` files into.
    pub outbox_dir: PathBuf,
    pub log_path: PathBuf,
    /// Fill an empty catalogue with a few demo recipes on startup.
    pub seed_demo_data: bool,
    pub mail_from: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            database_path: PathBuf::from(".recipo/recipo.db"),
            gateway_timeout_ms: 5000,
            outbox_dir: PathBuf::from(".recipo/outbox"),
            log_path: PathBuf::from(".recipo/recipo.log"),
            seed_demo_data: true,
            mail_from: recipo_core::mail::DEFAULT_FROM.to_owned(),
        }
    }
}

impl Config {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms.max(1))
    }

    /// Where the current session token is remembered between runs.
    pub fn session_file(&self) -> PathBuf {
        self.database_path.with_file_name("session")
    }
}

/// Returns the path to the recipo config file.
///
/// Prefers `$XDG_CONFIG_HOME/recipo/config.toml`; falls back to
/// `~/.config/recipo/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("recipo").join("config.toml")
}

/// Parses a config document. Errors carry the toml diagnostic text.
pub fn parse(raw: &str) -> Result<Config, String> {
    toml::from_str(raw).map_err(|e| e.to_string())
}

/// Loads the config at `path` and applies the `RECIPO_DB` override.
///
/// Returns the config and, when the file existed but could not be parsed, a
/// warning describing why the defaults were used instead.
pub fn load(path: &Path) -> (Config, Option<String>) {
    let (mut config, warning) = match std::fs::read_to_string(path) {
        Ok(raw) => match parse(&raw) {
            Ok(c) => (c, None),
            Err(e) => (
                Config::default(),
                Some(format!("config parse error in {}: {e}", path.display())),
            ),
        },
        Err(_) => (Config::default(), None),
    };
    if let Some(db) = std::env::var_os(DB_ENV) {
        config.database_path = PathBuf::from(db);
    }
    (config, warning)
}
