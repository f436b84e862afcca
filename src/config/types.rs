use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub assets: AssetsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL clients use to reach this server. Catalog URLs are built
    /// from it. Defaults to `http://{host}:{port}` with a wildcard host
    /// replaced by `localhost`.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Upper bound on handler time for a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8081
}
fn default_request_timeout() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// The base URL used to build catalog links, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = match self.host.as_str() {
                    "0.0.0.0" | "::" | "[::]" => "localhost",
                    other => other,
                };
                format!("http://{}:{}", host, self.port)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory for the database when `database` is not set.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root of the derived-asset tree (`thumbnails/`, `subtitles/`).
    #[serde(default = "default_derived_dir")]
    pub derived_dir: PathBuf,

    /// SQLite database file. Defaults to `{data_dir}/localflix.db`.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_derived_dir() -> PathBuf {
    PathBuf::from("./tmp")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            derived_dir: default_derived_dir(),
            database: None,
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.data_dir.join("localflix.db"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Per-invocation timeout. Capped at 300 seconds.
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of tool processes running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_tool_timeout() -> u64 {
    localflix_av::command::DEFAULT_TIMEOUT.as_secs()
}
fn default_max_concurrent() -> usize {
    localflix_av::command::DEFAULT_MAX_CONCURRENT
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_tool_timeout(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Seek position for thumbnail extraction.
    #[serde(default = "default_thumbnail_offset")]
    pub thumbnail_offset_secs: f64,
}

fn default_thumbnail_offset() -> f64 {
    localflix_av::recipes::DEFAULT_THUMBNAIL_OFFSET_SECS
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            thumbnail_offset_secs: default_thumbnail_offset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// File extensions (without dot, case-insensitive) listed by a scan.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files processed in parallel during a single listing.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

fn default_extensions() -> Vec<String> {
    localflix_common::paths::media_extensions()
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}
fn default_scan_concurrency() -> usize {
    4
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            scan_concurrency: default_scan_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Read buffer size for range streaming, in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    crate::streaming::DEFAULT_BUFFER_SIZE
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}
