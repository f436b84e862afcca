//! Catalog scanning: turn a registered folder into a list of media files.
//!
//! A listing reads the folder's directory, keeps files on the extension
//! allow-list, probes each one for its duration and makes sure both derived
//! assets exist. Entries are processed concurrently but returned in name
//! order. A failure on one entry only blanks the affected fields.

mod repository;

pub use repository::{DbFolderRepository, FolderRepository};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use localflix_av::{probe, ToolRunner};
use localflix_common::paths::{base_name, has_extension};
use localflix_common::{AssetKind, Error, Folder, FolderId, MediaFile, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::assets::{AssetResult, DerivedAssetCache};

/// Characters escaped in a URL path segment. RFC 3986 unreserved
/// characters stay literal.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single URL path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Settings for a [`CatalogScanner`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Public base URL without a trailing slash.
    pub base_url: String,
    /// Allowed file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Entries processed at once within one listing.
    pub concurrency: usize,
}

/// Lists the media files of a folder.
#[derive(Clone)]
pub struct CatalogScanner {
    folders: Arc<dyn FolderRepository>,
    assets: DerivedAssetCache,
    runner: Arc<dyn ToolRunner>,
    options: Arc<ScanOptions>,
}

impl CatalogScanner {
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        assets: DerivedAssetCache,
        runner: Arc<dyn ToolRunner>,
        options: ScanOptions,
    ) -> Self {
        Self {
            folders,
            assets,
            runner,
            options: Arc::new(options),
        }
    }

    /// Resolve a folder id, failing with `NotFound` if it is not registered.
    pub async fn folder(&self, folder_id: FolderId) -> Result<Folder> {
        self.folders
            .get(folder_id)
            .await?
            .ok_or_else(|| Error::not_found("folder", folder_id))
    }

    /// List the media files of a folder, generating missing assets.
    pub async fn list_files(&self, folder_id: FolderId) -> Result<Vec<MediaFile>> {
        let folder = self.folder(folder_id).await?;
        let names = self.read_entries(&folder).await?;

        tracing::debug!(
            folder_id = %folder_id,
            path = %folder.path,
            entries = names.len(),
            "Scanning folder"
        );

        let folder = &folder;
        let files = stream::iter(names)
            .map(|name| self.describe(folder, name))
            .buffered(self.options.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        Ok(files)
    }

    /// Names of the allowed regular files in the folder, sorted by name.
    async fn read_entries(&self, folder: &Folder) -> Result<Vec<String>> {
        let dir = PathBuf::from(&folder.path);
        let options = Arc::clone(&self.options);

        tokio::task::spawn_blocking(move || read_media_names(&dir, &options.extensions))
            .await
            .map_err(|e| Error::internal(format!("spawn_blocking join error: {e}")))?
    }

    async fn describe(&self, folder: &Folder, name: String) -> MediaFile {
        let path = Path::new(&folder.path).join(&name);
        let base = base_name(&name);

        let duration = match probe::probe_duration(self.runner.as_ref(), &path).await {
            Ok(seconds) => seconds,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to probe duration");
                0.0
            }
        };
        let hint = (duration > 0.0).then_some(duration);

        let (thumbnail, subtitle) = tokio::join!(
            self.assets
                .ensure_with_duration(AssetKind::Thumbnail, folder.id, &path, base, hint),
            self.assets.ensure(AssetKind::Subtitle, folder.id, &path, base),
        );

        MediaFile {
            url: format!(
                "{}/stream/{}/{}",
                self.options.base_url,
                folder.id,
                encode_segment(&name)
            ),
            subtitles_url: self.asset_url(AssetKind::Subtitle, folder.id, base, &subtitle),
            thumbnail_url: self.asset_url(AssetKind::Thumbnail, folder.id, base, &thumbnail),
            path: path.to_string_lossy().into_owned(),
            name,
            category_id: folder.category_id,
            folder_id: folder.id,
            duration_seconds: duration,
        }
    }

    /// URL of a derived asset, or an empty string when it is unavailable.
    fn asset_url(
        &self,
        kind: AssetKind,
        folder_id: FolderId,
        base: &str,
        result: &AssetResult,
    ) -> String {
        match result {
            Ok(Some(_)) => format!(
                "{}/{}/{}/{}.{}",
                self.options.base_url,
                kind.dir_name(),
                folder_id,
                encode_segment(base),
                kind.extension()
            ),
            Ok(None) | Err(_) => String::new(),
        }
    }
}

fn read_media_names<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found("directory", dir.display()));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        // Follows symlinks, so linked files are listed too.
        if !path.is_file() || !has_extension(&path, extensions) {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => {
                tracing::warn!(name = ?raw, "Skipping file with non UTF-8 name");
            }
        }
    }

    names.sort();
    Ok(names)
}
