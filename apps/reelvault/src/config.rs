//! Server configuration.
//!
//! Read from the TOML file named by `$REELVAULT_CONFIG`, falling back to
//! `reelvault.toml` in the working directory. Every field has a default,
//! so a missing file or a partial one is valid.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reelvault_protocol::UploadConfig;
use reelvault_protocol::constants::{
    ACCEPT_ANY_FILE_TYPE, DEFAULT_CHUNK_RETRY_INTERVAL_MS, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_UPLOAD_SIZE, THROTTLE_PROGRESS_CALLBACKS,
};
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "REELVAULT_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "reelvault.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Externally visible base URL, used for the widget's upload target.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_merged_dir")]
    pub merged_dir: PathBuf,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Ceiling on the bytes stored for one upload.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_chunk_retry_interval_ms")]
    pub chunk_retry_interval_ms: u64,

    #[serde(default = "default_true")]
    pub test_chunks: bool,

    /// Encoder executable; looked up on `PATH` when not absolute.
    #[serde(default = "default_encoder_program")]
    pub encoder_program: PathBuf,

    /// Concurrent encoder processes.
    #[serde(default = "default_transcode_workers")]
    pub transcode_workers: usize,

    /// Seconds between janitor sweeps (0 disables the janitor).
    #[serde(default = "default_janitor_interval_secs")]
    pub janitor_interval_secs: u64,

    /// Age in seconds after which abandoned uploads are removed.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_public_url() -> String {
    "http://localhost:3000".into()
}

fn default_upload_dir() -> PathBuf {
    "uploads".into()
}

fn default_merged_dir() -> PathBuf {
    "merged".into()
}

fn default_catalog_path() -> PathBuf {
    "file_list.json".into()
}

fn default_max_upload_size() -> u64 {
    DEFAULT_MAX_UPLOAD_SIZE
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_chunk_retry_interval_ms() -> u64 {
    DEFAULT_CHUNK_RETRY_INTERVAL_MS
}

fn default_true() -> bool {
    true
}

fn default_encoder_program() -> PathBuf {
    "ffmpeg".into()
}

fn default_transcode_workers() -> usize {
    1
}

fn default_janitor_interval_secs() -> u64 {
    3600
}

fn default_stale_after_secs() -> u64 {
    86_400
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: default_public_url(),
            upload_dir: default_upload_dir(),
            merged_dir: default_merged_dir(),
            catalog_path: default_catalog_path(),
            max_upload_size: default_max_upload_size(),
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            chunk_retry_interval_ms: default_chunk_retry_interval_ms(),
            test_chunks: default_true(),
            encoder_program: default_encoder_program(),
            transcode_workers: default_transcode_workers(),
            janitor_interval_secs: default_janitor_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from the configured path, or defaults if absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads configuration from `path`. A missing file yields defaults and
    /// is not created.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration read");
        Ok(config)
    }

    /// Options served to the upload widget.
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            target: format!("{}/upload", self.public_url.trim_end_matches('/')),
            file_types: vec![ACCEPT_ANY_FILE_TYPE.into()],
            max_file_size: self.max_upload_size,
            chunk_size: self.chunk_size,
            test_chunks: self.test_chunks,
            throttle_progress_callbacks: THROTTLE_PROGRESS_CALLBACKS,
            max_retries: self.max_retries,
            chunk_retry_interval: self.chunk_retry_interval_ms,
        }
    }

    /// Janitor period, or `None` when disabled.
    pub fn janitor_interval(&self) -> Option<Duration> {
        (self.janitor_interval_secs > 0).then(|| Duration::from_secs(self.janitor_interval_secs))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
