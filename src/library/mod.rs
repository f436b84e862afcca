//! Category and folder management.
//!
//! All mutations go through [`LibraryService`], which serializes writes with
//! a process-wide lock and keeps each folder's asset directories in step
//! with its database row.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use localflix_common::{Category, CategoryId, Error, Folder, FolderId, Result};
use localflix_db::pool::{get_conn, DbPool};
use localflix_db::queries::{categories, folders};
use parking_lot::Mutex;

use crate::assets::{AssetStorage, DerivedAssetCache};

/// Lets the user choose a directory to register.
///
/// Supplied by whatever embeds the library (a desktop shell opens a native
/// dialog); `None` means the user cancelled.
pub trait FolderPicker: Send + Sync {
    fn pick_folder(&self) -> Option<PathBuf>;
}

/// [`FolderPicker`] that always returns a preset answer.
#[derive(Debug, Clone, Default)]
pub struct FixedFolderPicker(pub Option<PathBuf>);

impl FolderPicker for FixedFolderPicker {
    fn pick_folder(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Category and folder CRUD over the metadata store.
#[derive(Clone)]
pub struct LibraryService {
    pool: DbPool,
    assets: DerivedAssetCache,
    write_lock: Arc<Mutex<()>>,
}

impl LibraryService {
    pub fn new(pool: DbPool, assets: DerivedAssetCache) -> Self {
        Self {
            pool,
            assets,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn storage(&self) -> &AssetStorage {
        self.assets.storage()
    }

    /// Run blocking store work off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&LibraryService) -> Result<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(&this))
            .await
            .map_err(|e| Error::internal(format!("spawn_blocking join error: {e}")))?
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.blocking(|svc| {
            let conn = get_conn(&svc.pool)?;
            categories::list_categories(&conn)
        })
        .await
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category> {
        self.blocking(move |svc| {
            let conn = get_conn(&svc.pool)?;
            categories::get_category(&conn, id)?
                .ok_or_else(|| Error::not_found("category", id))
        })
        .await
    }

    pub async fn find_category(&self, name: &str) -> Result<Option<Category>> {
        let name = name.to_string();
        self.blocking(move |svc| {
            let conn = get_conn(&svc.pool)?;
            categories::get_category_by_name(&conn, &name)
        })
        .await
    }

    /// Create a category. Names are trimmed and must be unique.
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let name = validate_name(name)?;
        self.blocking(move |svc| {
            let _guard = svc.write_lock.lock();
            let conn = get_conn(&svc.pool)?;
            let category = categories::create_category(&conn, &name)?;
            tracing::info!(category_id = %category.id, name = %category.name, "Category created");
            Ok(category)
        })
        .await
    }

    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category> {
        let name = validate_name(name)?;
        self.blocking(move |svc| {
            let _guard = svc.write_lock.lock();
            let conn = get_conn(&svc.pool)?;
            categories::rename_category(&conn, id, &name)
        })
        .await
    }

    /// Delete a category. Refused with `Conflict` while it has folders.
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        self.blocking(move |svc| {
            let _guard = svc.write_lock.lock();
            let conn = get_conn(&svc.pool)?;
            if !folders::list_folders_by_category(&conn, id)?.is_empty() {
                return Err(Error::conflict(format!("category {id} still has folders")));
            }
            categories::delete_category(&conn, id)?;
            tracing::info!(category_id = %id, "Category deleted");
            Ok(())
        })
        .await
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.blocking(|svc| {
            let conn = get_conn(&svc.pool)?;
            folders::list_folders(&conn)
        })
        .await
    }

    /// Folders of one category. An unknown category has no folders.
    pub async fn list_folders_by_category(&self, category_id: CategoryId) -> Result<Vec<Folder>> {
        self.blocking(move |svc| {
            let conn = get_conn(&svc.pool)?;
            folders::list_folders_by_category(&conn, category_id)
        })
        .await
    }

    pub async fn get_folder(&self, id: FolderId) -> Result<Folder> {
        self.blocking(move |svc| {
            let conn = get_conn(&svc.pool)?;
            folders::get_folder(&conn, id)?
                .ok_or_else(|| Error::not_found("folder", id))
        })
        .await
    }

    /// Register a directory under a category and create its asset
    /// directories.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - the path is not absolute or not a directory
    /// * `NotFound` - the category does not exist
    pub async fn create_folder(&self, path: &Path, category_id: CategoryId) -> Result<Folder> {
        let path = path.to_path_buf();
        self.blocking(move |svc| {
            let path_str = validate_folder_path(&path)?;

            let _guard = svc.write_lock.lock();
            let conn = get_conn(&svc.pool)?;
            let folder = folders::create_folder(&conn, &path_str, category_id)?;

            if let Err(e) = svc.storage().create_folder_dirs(folder.id) {
                tracing::error!(folder_id = %folder.id, error = %e, "Failed to create asset directories");
                folders::delete_folder(&conn, folder.id)?;
                let _ = svc.storage().remove_folder_dirs(folder.id);
                return Err(Error::Io(e));
            }

            tracing::info!(
                folder_id = %folder.id,
                category_id = %category_id,
                path = %folder.path,
                "Folder registered"
            );
            Ok(folder)
        })
        .await
    }

    /// Ask `picker` for a directory and register it. Returns `None` when
    /// the user cancels.
    pub async fn add_picked_folder(
        &self,
        picker: &dyn FolderPicker,
        category_id: CategoryId,
    ) -> Result<Option<Folder>> {
        match picker.pick_folder() {
            Some(path) => self.create_folder(&path, category_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Delete a folder row and both of its asset directories.
    ///
    /// Asset generation still running for the folder fails instead of
    /// recreating the directories.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the folder does not exist
    /// * `PartialCleanup` - the row is gone but an asset directory remains
    pub async fn delete_folder(&self, id: FolderId) -> Result<()> {
        self.blocking(move |svc| {
            let _guard = svc.write_lock.lock();
            let conn = get_conn(&svc.pool)?;
            folders::delete_folder(&conn, id)?;
            svc.assets.forget_folder(id);

            svc.storage().remove_folder_dirs(id).map_err(|e| {
                Error::partial_cleanup(
                    "folder",
                    id,
                    format!("asset directories were not removed: {e}"),
                )
            })?;

            tracing::info!(folder_id = %id, "Folder deleted");
            Ok(())
        })
        .await
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_input("Category name cannot be empty"));
    }
    Ok(name.to_string())
}

fn validate_folder_path(path: &Path) -> Result<String> {
    if !path.is_absolute() {
        return Err(Error::invalid_input(format!(
            "Folder path must be absolute: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(Error::invalid_input(format!(
            "Folder path is not a directory: {}",
            path.display()
        )));
    }
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_input("Folder path is not valid UTF-8"))
}
