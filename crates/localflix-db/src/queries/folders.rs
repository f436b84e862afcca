//! Folder database queries.

use localflix_common::{CategoryId, Error, Folder, FolderId, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{classify, Failure};

fn row_to_folder(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: FolderId::new(row.get(0)?),
        path: row.get(1)?,
        category_id: CategoryId::new(row.get(2)?),
    })
}

/// Create a new folder under a category.
///
/// # Returns
///
/// * `Ok(Folder)` - The created folder
/// * `Err(Error::NotFound)` - If the category does not exist
/// * `Err(Error)` - If a database error occurs
pub fn create_folder(conn: &Connection, path: &str, category_id: CategoryId) -> Result<Folder> {
    conn.execute(
        "INSERT INTO folders (path, category_id) VALUES (:path, :category_id)",
        rusqlite::named_params! {
            ":path": path,
            ":category_id": category_id.get(),
        },
    )
    .map_err(|e| match classify(e) {
        Failure::ForeignKey => Error::not_found("category", category_id),
        Failure::Unique => Error::database("unexpected unique constraint failure"),
        Failure::Other(e) => e,
    })?;

    Ok(Folder {
        id: FolderId::new(conn.last_insert_rowid()),
        path: path.to_string(),
        category_id,
    })
}

/// Get a folder by ID.
///
/// # Returns
///
/// * `Ok(Some(Folder))` - The folder if found
/// * `Ok(None)` - If the folder does not exist
pub fn get_folder(conn: &Connection, id: FolderId) -> Result<Option<Folder>> {
    conn.query_row(
        "SELECT id, path, category_id FROM folders WHERE id = :id",
        rusqlite::named_params! { ":id": id.get() },
        row_to_folder,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List all folders.
pub fn list_folders(conn: &Connection) -> Result<Vec<Folder>> {
    let mut stmt = conn
        .prepare("SELECT id, path, category_id FROM folders ORDER BY id")
        .map_err(|e| Error::database(e.to_string()))?;

    let folders = stmt
        .query_map([], row_to_folder)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(folders)
}

/// List the folders of one category.
pub fn list_folders_by_category(conn: &Connection, category_id: CategoryId) -> Result<Vec<Folder>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, path, category_id FROM folders
             WHERE category_id = :category_id ORDER BY id",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let folders = stmt
        .query_map(
            rusqlite::named_params! { ":category_id": category_id.get() },
            row_to_folder,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(folders)
}

/// Delete a folder row.
///
/// # Returns
///
/// * `Ok(())` - If the row was deleted
/// * `Err(Error::NotFound)` - If the folder does not exist
pub fn delete_folder(conn: &Connection, id: FolderId) -> Result<()> {
    let rows_affected = conn
        .execute(
            "DELETE FROM folders WHERE id = :id",
            rusqlite::named_params! { ":id": id.get() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if rows_affected == 0 {
        return Err(Error::not_found("folder", id));
    }

    Ok(())
}
