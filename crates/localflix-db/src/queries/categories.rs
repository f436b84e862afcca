//! Category database queries.
//!
//! Category names are unique; duplicate names surface as
//! [`Error::Conflict`](localflix_common::Error::Conflict).

use localflix_common::{Category, CategoryId, Error, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{classify, Failure};

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: CategoryId::new(row.get(0)?),
        name: row.get(1)?,
    })
}

/// Create a new category.
///
/// # Returns
///
/// * `Ok(Category)` - The created category
/// * `Err(Error::Conflict)` - If a category with this name already exists
/// * `Err(Error)` - If a database error occurs
pub fn create_category(conn: &Connection, name: &str) -> Result<Category> {
    conn.execute(
        "INSERT INTO categories (name) VALUES (:name)",
        rusqlite::named_params! { ":name": name },
    )
    .map_err(|e| match classify(e) {
        Failure::Unique => Error::conflict(format!("category already exists: {}", name)),
        Failure::ForeignKey => Error::database("unexpected foreign key failure"),
        Failure::Other(e) => e,
    })?;

    Ok(Category {
        id: CategoryId::new(conn.last_insert_rowid()),
        name: name.to_string(),
    })
}

/// Get a category by ID.
///
/// # Returns
///
/// * `Ok(Some(Category))` - The category if found
/// * `Ok(None)` - If the category does not exist
pub fn get_category(conn: &Connection, id: CategoryId) -> Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE id = :id",
        rusqlite::named_params! { ":id": id.get() },
        row_to_category,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get a category by its exact name.
pub fn get_category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE name = :name",
        rusqlite::named_params! { ":name": name },
        row_to_category,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List all categories in creation order.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM categories ORDER BY id")
        .map_err(|e| Error::database(e.to_string()))?;

    let categories = stmt
        .query_map([], row_to_category)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(categories)
}

/// Rename a category.
///
/// # Returns
///
/// * `Ok(Category)` - The renamed category
/// * `Err(Error::NotFound)` - If the category does not exist
/// * `Err(Error::Conflict)` - If another category already uses `name`
pub fn rename_category(conn: &Connection, id: CategoryId, name: &str) -> Result<Category> {
    let rows_affected = conn
        .execute(
            "UPDATE categories SET name = :name WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.get(),
                ":name": name,
            },
        )
        .map_err(|e| match classify(e) {
            Failure::Unique => Error::conflict(format!("category already exists: {}", name)),
            Failure::ForeignKey => Error::database("unexpected foreign key failure"),
            Failure::Other(e) => e,
        })?;

    if rows_affected == 0 {
        return Err(Error::not_found("category", id));
    }

    Ok(Category {
        id,
        name: name.to_string(),
    })
}

/// Delete a category.
///
/// Fails with [`Error::Conflict`] while folders still reference it.
pub fn delete_category(conn: &Connection, id: CategoryId) -> Result<()> {
    let in_use: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE category_id = :id)",
            rusqlite::named_params! { ":id": id.get() },
            |row| row.get(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;
    if in_use {
        return Err(Error::conflict(format!("category {} still has folders", id)));
    }

    let rows_affected = conn
        .execute(
            "DELETE FROM categories WHERE id = :id",
            rusqlite::named_params! { ":id": id.get() },
        )
        .map_err(|e| match classify(e) {
            Failure::ForeignKey => {
                Error::conflict(format!("category {} still has folders", id))
            }
            Failure::Unique => Error::database("unexpected unique constraint failure"),
            Failure::Other(e) => e,
        })?;

    if rows_affected == 0 {
        return Err(Error::not_found("category", id));
    }

    Ok(())
}
