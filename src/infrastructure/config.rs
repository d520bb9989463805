use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

fn default_binary_path() -> String {
  "wkhtmltopdf".to_string()
}

fn default_work_dir() -> String {
  "./data/pdf-work".to_string()
}

fn default_pool_size() -> usize {
  2
}

fn default_timeout_seconds() -> u64 {
  30
}

fn default_max_input_bytes() -> usize {
  10 * 1024 * 1024
}

fn default_presign_ttl_seconds() -> u64 {
  900
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub pdf: PdfConfig,
  pub storage: StorageConfig,
}

/// PDF conversion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
  #[serde(default = "default_binary_path")]
  pub binary_path: String,
  /// Scratch directory for the converter's temporary HTML/PDF files.
  #[serde(default = "default_work_dir")]
  pub work_dir: String,
  /// Concurrent conversion slots; requests beyond this wait in line.
  #[serde(default = "default_pool_size")]
  pub pool_size: usize,
  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u64,
  #[serde(default = "default_max_input_bytes")]
  pub max_input_bytes: usize,
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
  pub root_dir: String,
  pub base_url: String,
  #[serde(default = "default_presign_ttl_seconds")]
  pub presign_ttl_seconds: u64,
}

impl Config {
  /// Load configuration from files and environment variables
  ///
  /// Configuration is loaded in the following order (later sources override earlier ones):
  /// 1. config/default.toml
  /// 2. config/local.toml (if exists)
  /// 3. Environment variables with FATTURE_ prefix
  ///
  /// Environment variables use double underscores as section separators:
  /// - `FATTURE_PDF__BINARY_PATH=/usr/local/bin/wkhtmltopdf`
  /// - `FATTURE_PDF__POOL_SIZE=4`
  /// - `FATTURE_STORAGE__ROOT_DIR=/var/lib/fatture/artifacts`
  pub fn load() -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    let config = ConfigBuilder::builder()
      .add_source(File::with_name("config/default").required(true))
      .add_source(File::with_name("config/local").required(false))
      .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
      .add_source(
        Environment::with_prefix("FATTURE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;

    config.try_deserialize()
  }
}
