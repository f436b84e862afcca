//! HTTP gateway.
//!
//! Handlers only extract and validate parameters, call into the library,
//! catalog and streaming layers, and translate errors to status codes.

use crate::assets::{AssetStorage, DerivedAssetCache};
use crate::catalog::{CatalogScanner, DbFolderRepository, ScanOptions};
use crate::config::Config;
use crate::library::LibraryService;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use localflix_av::{tools, ProcessToolRunner, ToolRunner};
use localflix_db::pool::DbPool;
use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod error;
pub mod routes_library;
pub mod routes_media;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub library: LibraryService,
    pub catalog: CatalogScanner,
    pub assets: DerivedAssetCache,
}

impl AppContext {
    /// Wire up every service from configuration, a database pool and the
    /// tool runner used for probing and asset generation.
    pub fn new(config: Config, pool: DbPool, runner: Arc<dyn ToolRunner>) -> Self {
        let assets = DerivedAssetCache::new(
            AssetStorage::new(config.storage.derived_dir.clone()),
            runner.clone(),
            config.assets.thumbnail_offset_secs,
        );
        let catalog = CatalogScanner::new(
            Arc::new(DbFolderRepository::new(pool.clone())),
            assets.clone(),
            runner,
            ScanOptions {
                base_url: config.server.base_url(),
                extensions: config.catalog.extensions.clone(),
                concurrency: config.catalog.scan_concurrency,
            },
        );
        let library = LibraryService::new(pool, assets.clone());

        Self {
            config: Arc::new(config),
            library,
            catalog,
            assets,
        }
    }

    /// Like [`AppContext::new`] with a subprocess-backed tool runner built
    /// from the `[tools]` section.
    pub fn with_process_runner(config: Config, pool: DbPool) -> Self {
        let runner = Arc::new(process_runner(&config));
        Self::new(config, pool, runner)
    }
}

/// Build the subprocess tool runner described by the config.
pub fn process_runner(config: &Config) -> ProcessToolRunner {
    let paths = tools::resolve_tool_paths(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    );
    ProcessToolRunner::new(
        paths,
        Duration::from_secs(config.tools.timeout_secs),
        config.tools.max_concurrent,
    )
}

/// Parse a path segment as an id, rejecting garbage with 400.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| localflix_common::Error::invalid_input(format!("Invalid {what}: {raw:?}")).into())
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    let request_timeout = Duration::from_secs(ctx.config.server.request_timeout_secs);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_library::library_routes())
        .merge(routes_media::media_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// A bound, not yet running HTTP server.
pub struct MediaServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl MediaServer {
    /// Bind the listening socket. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr, ctx: AppContext) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            router: create_router(ctx),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves, then drain in-flight connections.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Starting server on {}", self.local_addr);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Run the server on a background task.
    pub fn spawn(self) -> ServerHandle {
        let (tx, rx) = oneshot::channel::<()>();
        let local_addr = self.local_addr;
        let task = tokio::spawn(self.serve(async move {
            let _ = rx.await;
        }));

        ServerHandle {
            local_addr,
            shutdown: tx,
            task,
        }
    }
}

/// Handle to a server started with [`MediaServer::spawn`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight ones to finish.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task.await.context("Server task panicked")?
    }
}

/// Start the HTTP server and run until Ctrl+C or SIGTERM.
pub async fn start_server(config: Config, pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::with_process_runner(config, pool);

    MediaServer::bind(addr, ctx)
        .await?
        .serve(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
