//! Runtime configuration, deserialised from `config.toml` and `SYLLABUS_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use syllabus_core::status::StatusPolicy;
use syllabus_store_sqlite::StoreOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Longest wait for a source's merge scope.
  #[serde(default = "default_timeout_ms")]
  pub lock_timeout_ms: u64,
  /// SQLite `busy_timeout`.
  #[serde(default = "default_timeout_ms")]
  pub busy_timeout_ms: u64,
  /// A run finishing within this many days keeps a source `complete`.
  #[serde(default = "default_recent_run_days")]
  pub recent_run_days: i64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("syllabus.db") }

fn default_timeout_ms() -> u64 { 5_000 }

fn default_recent_run_days() -> i64 { 7 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      lock_timeout: Duration::from_millis(self.lock_timeout_ms),
      busy_timeout: Duration::from_millis(self.busy_timeout_ms),
    }
  }

  pub fn status_policy(&self) -> StatusPolicy { StatusPolicy::with_recent_days(self.recent_run_days) }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn load(toml: &str) -> ServerConfig {
    ::config::Config::builder()
      .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = load("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("syllabus.db"));
    assert_eq!(cfg.store_options().lock_timeout, Duration::from_secs(5));
    assert_eq!(cfg.status_policy(), StatusPolicy::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = load(
      r#"
        port = 9000
        lock_timeout_ms = 250
        recent_run_days = 14
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_options().lock_timeout, Duration::from_millis(250));
    assert_eq!(cfg.status_policy(), StatusPolicy::with_recent_days(14));
  }

  #[test]
  fn tilde_paths_expand_under_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
