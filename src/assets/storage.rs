//! Filesystem layout of derived assets.
//!
//! Assets live at `{root}/{kind}s/{folder_id}/{base_name}.{ext}`, e.g.
//! `tmp/thumbnails/3/Movie.2020.png`. The presence of a file at that path
//! is the only record that the asset exists.
//!
//! Per-folder directories are created only when a folder is registered.
//! Generation never creates them, so a folder whose directories were removed
//! cannot be repopulated by a generation that was already running.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use localflix_common::paths::validate_file_name;
use localflix_common::{AssetKind, FolderId};
use parking_lot::RwLock;
use tempfile::NamedTempFile;

/// Filesystem manager for derived assets.
///
/// All methods block; call them from `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct AssetStorage {
    root: PathBuf,
    /// Temp-file creation and publishing hold this shared; creating and
    /// removing folder directories hold it exclusively.
    layout: Arc<RwLock<()>>,
}

impl AssetStorage {
    /// Create a new `AssetStorage` rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: Arc::new(RwLock::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all assets of `kind` for one folder.
    pub fn folder_dir(&self, kind: AssetKind, folder_id: FolderId) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(folder_id.to_string())
    }

    /// Deterministic location of one asset.
    pub fn asset_path(&self, kind: AssetKind, folder_id: FolderId, base_name: &str) -> PathBuf {
        self.folder_dir(kind, folder_id)
            .join(format!("{}.{}", base_name, kind.extension()))
    }

    /// Resolve a file name taken from a request URL to a path inside the
    /// folder's asset directory.
    pub fn served_path(
        &self,
        kind: AssetKind,
        folder_id: FolderId,
        file_name: &str,
    ) -> localflix_common::Result<PathBuf> {
        let file_name = validate_file_name(file_name)?;
        Ok(self.folder_dir(kind, folder_id).join(file_name))
    }

    /// Create a hidden temporary file next to the final asset location.
    ///
    /// The file carries the asset's extension so the tool infers the right
    /// output format, and lives in the same directory so publishing it is a
    /// single rename. Fails with `NotFound` when the folder's directory
    /// does not exist.
    pub fn temp_file(&self, kind: AssetKind, folder_id: FolderId) -> io::Result<NamedTempFile> {
        let _layout = self.layout.read();

        tempfile::Builder::new()
            .prefix(".")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(self.folder_dir(kind, folder_id))
    }

    /// Rename a finished temp file to the asset's final path.
    ///
    /// Fails with `NotFound` if the folder's directories were removed after
    /// the temp file was created.
    pub fn publish(
        &self,
        temp: NamedTempFile,
        kind: AssetKind,
        folder_id: FolderId,
        base_name: &str,
    ) -> io::Result<PathBuf> {
        let _layout = self.layout.read();

        let target = self.asset_path(kind, folder_id, base_name);
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }

    /// Create the asset directories of a newly registered folder.
    pub fn create_folder_dirs(&self, folder_id: FolderId) -> io::Result<()> {
        let _layout = self.layout.write();
        for kind in AssetKind::ALL {
            std::fs::create_dir_all(self.folder_dir(kind, folder_id))?;
        }
        Ok(())
    }

    /// Remove every asset directory of a folder.
    ///
    /// Directories that are already gone are not an error. All kinds are
    /// attempted; the first failure is returned.
    pub fn remove_folder_dirs(&self, folder_id: FolderId) -> io::Result<()> {
        let _layout = self.layout.write();
        let mut first_error = None;

        for kind in AssetKind::ALL {
            let dir = self.folder_dir(kind, folder_id);
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        folder_id = %folder_id,
                        path = %dir.display(),
                        error = %e,
                        "Failed to remove asset directory"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path_layout() {
        let storage = AssetStorage::new("/data/tmp");
        assert_eq!(
            storage.asset_path(AssetKind::Thumbnail, FolderId::new(3), "Movie.2020"),
            PathBuf::from("/data/tmp/thumbnails/3/Movie.2020.png")
        );
        assert_eq!(
            storage.asset_path(AssetKind::Subtitle, FolderId::new(3), "Movie.2020"),
            PathBuf::from("/data/tmp/subtitles/3/Movie.2020.vtt")
        );
    }

    #[test]
    fn test_served_path_rejects_traversal() {
        let storage = AssetStorage::new("/data/tmp");
        assert!(storage
            .served_path(AssetKind::Thumbnail, FolderId::new(1), "../../etc/passwd")
            .is_err());
        assert_eq!(
            storage
                .served_path(AssetKind::Subtitle, FolderId::new(1), "a.vtt")
                .unwrap(),
            PathBuf::from("/data/tmp/subtitles/1/a.vtt")
        );
    }

    #[test]
    fn test_temp_file_is_hidden_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());
        storage.create_folder_dirs(FolderId::new(9)).unwrap();

        let temp = storage.temp_file(AssetKind::Thumbnail, FolderId::new(9)).unwrap();
        assert_eq!(
            temp.path().parent().unwrap(),
            storage.folder_dir(AssetKind::Thumbnail, FolderId::new(9))
        );
        let name = temp.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with('.'));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_create_and_remove_folder_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());
        let folder = FolderId::new(4);

        storage.create_folder_dirs(folder).unwrap();
        std::fs::write(storage.asset_path(AssetKind::Thumbnail, folder, "a"), b"png").unwrap();

        for kind in AssetKind::ALL {
            assert!(storage.folder_dir(kind, folder).is_dir());
        }

        storage.remove_folder_dirs(folder).unwrap();
        for kind in AssetKind::ALL {
            assert!(!storage.folder_dir(kind, folder).exists());
        }

        // Removing again is a no-op
        storage.remove_folder_dirs(folder).unwrap();
    }

    #[test]
    fn test_temp_file_requires_folder_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());

        let err = storage
            .temp_file(AssetKind::Subtitle, FolderId::new(11))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!storage.folder_dir(AssetKind::Subtitle, FolderId::new(11)).exists());
    }

    #[test]
    fn test_publish_after_removal_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());
        let folder = FolderId::new(12);
        storage.create_folder_dirs(folder).unwrap();

        let temp = storage.temp_file(AssetKind::Thumbnail, folder).unwrap();
        std::fs::write(temp.path(), b"png").unwrap();
        storage.remove_folder_dirs(folder).unwrap();

        let err = storage
            .publish(temp, AssetKind::Thumbnail, folder, "movie")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!storage.folder_dir(AssetKind::Thumbnail, folder).exists());
    }
}
