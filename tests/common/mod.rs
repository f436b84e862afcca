//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, temporary media
//! and derived-asset directories, a scripted [`FakeRunner`] in place of
//! ffmpeg/ffprobe, and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts the server on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use localflix::config::Config;
use localflix::server::{create_router, AppContext, MediaServer, ServerHandle};
use localflix_av::{Tool, ToolInvocation, ToolOutput, ToolRunner};
use localflix_common::{Category, Folder};
use localflix_db::pool::{init_memory_pool, DbPool};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://media.test:8081";
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";
pub const VTT: &[u8] = b"WEBVTT\n\n00:00.000 --> 00:01.000\nhello\n";

/// Stands in for ffmpeg and ffprobe.
///
/// Behaviour is keyed on the source file name: names containing `nosubs`
/// have no subtitle stream, `broken` fails every tool, and `short` reports
/// a two second duration.
#[derive(Default)]
pub struct FakeRunner {
    pub ffmpeg_calls: AtomicUsize,
    pub ffprobe_calls: AtomicUsize,
    pub delay: Duration,
}

impl FakeRunner {
    pub fn ffmpeg_calls(&self) -> usize {
        self.ffmpeg_calls.load(Ordering::SeqCst)
    }

    pub fn ffprobe_calls(&self) -> usize {
        self.ffprobe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn run(&self, invocation: ToolInvocation) -> localflix_av::Result<ToolOutput> {
        let args = invocation.args();
        tokio::time::sleep(self.delay).await;

        match invocation.tool() {
            Tool::Ffprobe => {
                self.ffprobe_calls.fetch_add(1, Ordering::SeqCst);
                let source = args.last().cloned().unwrap_or_default();
                if source.contains("broken") {
                    return Err(localflix_av::Error::tool_failed(
                        "ffprobe",
                        "Invalid data found when processing input",
                    ));
                }
                let duration = if source.contains("short") {
                    "2.0"
                } else {
                    "120.5"
                };
                Ok(ToolOutput {
                    stdout: format!(r#"{{"format": {{"duration": "{duration}"}}}}"#),
                    stderr: String::new(),
                })
            }
            Tool::Ffmpeg => {
                self.ffmpeg_calls.fetch_add(1, Ordering::SeqCst);
                let source = args
                    .iter()
                    .position(|a| a == "-i")
                    .and_then(|i| args.get(i + 1))
                    .cloned()
                    .unwrap_or_default();
                let output = args.last().cloned().unwrap_or_default();
                let subtitle = args.iter().any(|a| a == "0:s:0");

                if source.contains("broken") {
                    return Err(localflix_av::Error::tool_failed(
                        "ffmpeg",
                        "Invalid data found when processing input",
                    ));
                }
                if subtitle && source.contains("nosubs") {
                    return Err(localflix_av::Error::tool_failed(
                        "ffmpeg",
                        "Stream map '0:s:0' matches no streams.",
                    ));
                }

                let payload = if subtitle { VTT } else { PNG };
                tokio::fs::write(&output, payload).await?;
                Ok(ToolOutput::default())
            }
        }
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub runner: Arc<FakeRunner>,
    pub media_dir: TempDir,
    pub derived_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_runner(FakeRunner::default())
    }

    pub fn with_runner(runner: FakeRunner) -> Self {
        let media_dir = tempfile::tempdir().expect("failed to create media dir");
        let derived_dir = tempfile::tempdir().expect("failed to create derived dir");

        let mut config = Config::default();
        config.server.public_url = Some(BASE_URL.to_string());
        config.storage.derived_dir = derived_dir.path().to_path_buf();
        config.stream.buffer_size = 256;

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let runner = Arc::new(runner);
        let ctx = AppContext::new(config, db.clone(), runner.clone());

        Self {
            ctx,
            db,
            runner,
            media_dir,
            derived_dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start a server on a random port.
    pub async fn with_server() -> (Self, ServerHandle) {
        let harness = Self::new();
        let server = MediaServer::bind("127.0.0.1:0".parse().unwrap(), harness.ctx.clone())
            .await
            .expect("failed to bind random port");
        (harness, server.spawn())
    }

    /// Write a file into the media directory.
    pub fn media_file(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.media_dir.path().join(name);
        std::fs::write(&path, data).expect("failed to write media file");
        path
    }

    /// Create a category and register the media directory under it.
    pub async fn register_media_dir(&self) -> (Category, Folder) {
        let category = self
            .ctx
            .library
            .create_category("Movies")
            .await
            .expect("failed to create category");
        let folder = self
            .ctx
            .library
            .create_folder(self.media_dir.path(), category.id)
            .await
            .expect("failed to create folder");
        (category, folder)
    }

    pub fn derived_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.derived_dir.path().join(rel)
    }

    /// Send a request through the router without a socket.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Deterministic test pattern.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
