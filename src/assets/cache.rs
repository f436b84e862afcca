//! Lazy, single-flight generation of derived assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use futures::future::{BoxFuture, FutureExt, Shared};
use localflix_av::{recipes, ToolRunner};
use localflix_common::{AssetKind, FolderId};
use tokio::sync::oneshot;

use super::{AssetError, AssetStorage};

/// Outcome of [`DerivedAssetCache::ensure`]. `Ok(None)` means the asset
/// cannot exist for this source (no embedded subtitle stream).
pub type AssetResult = Result<Option<PathBuf>, AssetError>;

type Generation = Shared<BoxFuture<'static, AssetResult>>;

/// Identity of one derived asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub folder_id: FolderId,
    pub base_name: String,
}

impl AssetKey {
    pub fn new(kind: AssetKind, folder_id: FolderId, base_name: impl Into<String>) -> Self {
        Self {
            kind,
            folder_id,
            base_name: base_name.into(),
        }
    }
}

/// Filesystem-backed cache of derived assets.
///
/// Concurrent requests for the same missing asset share one generation,
/// which runs on its own task so a caller going away never cancels it.
/// Requests for different keys run in parallel.
#[derive(Clone)]
pub struct DerivedAssetCache {
    inner: Arc<Inner>,
}

struct Inner {
    storage: AssetStorage,
    runner: Arc<dyn ToolRunner>,
    thumbnail_offset_secs: f64,
    in_flight: DashMap<AssetKey, Generation>,
    /// Sources known to have no subtitle stream, for the life of the process.
    no_subtitles: DashSet<AssetKey>,
}

impl DerivedAssetCache {
    pub fn new(
        storage: AssetStorage,
        runner: Arc<dyn ToolRunner>,
        thumbnail_offset_secs: f64,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                runner,
                thumbnail_offset_secs,
                in_flight: DashMap::new(),
                no_subtitles: DashSet::new(),
            }),
        }
    }

    pub fn storage(&self) -> &AssetStorage {
        &self.inner.storage
    }

    /// Return the asset's path, generating it first if it does not exist.
    pub async fn ensure(
        &self,
        kind: AssetKind,
        folder_id: FolderId,
        source: &Path,
        base_name: &str,
    ) -> AssetResult {
        self.ensure_with_duration(kind, folder_id, source, base_name, None)
            .await
    }

    /// Like [`ensure`](Self::ensure), with the source duration if the caller
    /// already probed it. Thumbnails of clips shorter than the configured
    /// offset are taken at half the duration.
    pub async fn ensure_with_duration(
        &self,
        kind: AssetKind,
        folder_id: FolderId,
        source: &Path,
        base_name: &str,
        duration: Option<f64>,
    ) -> AssetResult {
        let key = AssetKey::new(kind, folder_id, base_name);

        // Fast path: already materialized or known to be impossible.
        if let Some(result) = self.inner.lookup(&key).await {
            return result;
        }

        let (generation, job) = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(e) => (e.get().clone(), None),
            Entry::Vacant(e) => {
                let (tx, rx) = oneshot::channel();
                let generation = async move { rx.await.unwrap_or(Err(AssetError::Aborted)) }
                    .boxed()
                    .shared();
                e.insert(generation.clone());
                (generation, Some(tx))
            }
        };

        if let Some(tx) = job {
            let inner = Arc::clone(&self.inner);
            let source = source.to_path_buf();
            tokio::spawn(async move {
                let claim = InFlightClaim {
                    inner: Arc::clone(&inner),
                    key,
                };
                let result = inner.generate(&claim.key, &source, duration).await;
                drop(claim);
                let _ = tx.send(result);
            });
        }

        generation.await
    }

    /// Number of generations currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Drop everything remembered about a deleted folder.
    ///
    /// Generations still running for it fail once they try to write, since
    /// the folder's directories are gone.
    pub fn forget_folder(&self, folder_id: FolderId) {
        self.inner.no_subtitles.retain(|key| key.folder_id != folder_id);
    }
}

/// Releases a key from the in-flight map when the generation finishes or
/// its task unwinds.
struct InFlightClaim {
    inner: Arc<Inner>,
    key: AssetKey,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.key);
    }
}

impl Inner {
    async fn lookup(&self, key: &AssetKey) -> Option<AssetResult> {
        let target = self
            .storage
            .asset_path(key.kind, key.folder_id, &key.base_name);

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Some(Ok(Some(target)));
        }

        if key.kind == AssetKind::Subtitle && self.no_subtitles.contains(key) {
            return Some(Ok(None));
        }

        None
    }

    async fn generate(&self, key: &AssetKey, source: &Path, duration: Option<f64>) -> AssetResult {
        // A previous generation may have published between our miss and
        // claiming the key.
        if let Some(result) = self.lookup(key).await {
            return result;
        }

        tracing::debug!(
            kind = %key.kind,
            folder_id = %key.folder_id,
            base_name = %key.base_name,
            "Generating derived asset"
        );

        let result = match key.kind {
            AssetKind::Thumbnail => self.generate_thumbnail(key, source, duration).await,
            AssetKind::Subtitle => self.generate_subtitle(key, source).await,
        };

        match &result {
            Ok(Some(path)) => {
                tracing::info!(kind = %key.kind, path = %path.display(), "Derived asset created");
            }
            Ok(None) => {
                tracing::debug!(
                    source = %source.display(),
                    "No embedded subtitle stream"
                );
            }
            Err(e) => {
                tracing::warn!(
                    kind = %key.kind,
                    source = %source.display(),
                    error = %e,
                    "Derived asset generation failed"
                );
            }
        }

        result
    }

    async fn generate_thumbnail(
        &self,
        key: &AssetKey,
        source: &Path,
        duration: Option<f64>,
    ) -> AssetResult {
        let offset =
            recipes::thumbnail_offset(self.thumbnail_offset_secs, duration.unwrap_or(0.0));
        let temp = self.temp_file(key).await?;

        self.runner
            .run(recipes::thumbnail(source, temp.path(), offset))
            .await?;

        self.publish(key, temp).await.map(Some)
    }

    async fn generate_subtitle(&self, key: &AssetKey, source: &Path) -> AssetResult {
        let temp = self.temp_file(key).await?;

        match self.runner.run(recipes::subtitle(source, temp.path())).await {
            Ok(_) => {}
            Err(e) if recipes::is_missing_subtitle_stream(&e) => {
                // Not remembered for a folder deleted in the meantime.
                let dir = self.storage.folder_dir(key.kind, key.folder_id);
                if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
                    self.no_subtitles.insert(key.clone());
                }
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        self.publish(key, temp).await.map(Some)
    }

    /// Run blocking storage work off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T, AssetError>
    where
        T: Send + 'static,
        F: FnOnce(&AssetStorage) -> Result<T, AssetError> + Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|_| AssetError::Aborted)?
    }

    async fn temp_file(&self, key: &AssetKey) -> Result<tempfile::NamedTempFile, AssetError> {
        let (kind, folder_id) = (key.kind, key.folder_id);
        self.blocking(move |storage| {
            storage
                .temp_file(kind, folder_id)
                .map_err(|e| folder_error(e, folder_id))
        })
        .await
    }

    /// Atomically move a finished temp file to the asset's final path.
    async fn publish(
        &self,
        key: &AssetKey,
        temp: tempfile::NamedTempFile,
    ) -> Result<PathBuf, AssetError> {
        let key = key.clone();
        self.blocking(move |storage| {
            let written = std::fs::metadata(temp.path())
                .map_err(|e| folder_error(e, key.folder_id))?
                .len();
            if written == 0 {
                return Err(AssetError::ToolFailed {
                    tool: "ffmpeg".to_string(),
                    message: format!("produced no {} output", key.kind),
                });
            }

            storage
                .publish(temp, key.kind, key.folder_id, &key.base_name)
                .map_err(|e| folder_error(e, key.folder_id))
        })
        .await
    }
}

fn folder_error(err: std::io::Error, folder_id: FolderId) -> AssetError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AssetError::FolderRemoved(folder_id)
    } else {
        err.into()
    }
}
