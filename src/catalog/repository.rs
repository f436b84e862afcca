//! Folder lookup used by the catalog and the stream endpoints.

use async_trait::async_trait;
use localflix_common::{Error, Folder, FolderId, Result};
use localflix_db::pool::{get_conn, DbPool};
use localflix_db::queries::folders;

/// Resolves folder ids to registered folders.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn get(&self, id: FolderId) -> Result<Option<Folder>>;
}

/// [`FolderRepository`] backed by the SQLite pool.
#[derive(Clone)]
pub struct DbFolderRepository {
    pool: DbPool,
}

impl DbFolderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for DbFolderRepository {
    async fn get(&self, id: FolderId) -> Result<Option<Folder>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            folders::get_folder(&conn, id)
        })
        .await
        .map_err(|e| Error::internal(format!("spawn_blocking join error: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localflix_db::pool::init_memory_pool;
    use localflix_db::queries::categories;

    #[tokio::test]
    async fn test_get_folder() {
        let pool = init_memory_pool().unwrap();
        let folder = {
            let conn = get_conn(&pool).unwrap();
            let movies = categories::create_category(&conn, "Movies").unwrap();
            folders::create_folder(&conn, "/media/movies", movies.id).unwrap()
        };

        let repo = DbFolderRepository::new(pool);
        assert_eq!(repo.get(folder.id).await.unwrap(), Some(folder));
        assert_eq!(repo.get(FolderId::new(404)).await.unwrap(), None);
    }
}
