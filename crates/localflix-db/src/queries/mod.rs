//! Database query modules.
//!
//! - categories: Category CRUD with unique names
//! - folders: Folder CRUD and per-category listing

pub mod categories;
pub mod folders;

use localflix_common::Error;
use rusqlite::ffi;

/// Classification of a failed statement, so callers can map constraint
/// violations to domain errors.
pub(crate) enum Failure {
    Unique,
    ForeignKey,
    Other(Error),
}

pub(crate) fn classify(err: rusqlite::Error) -> Failure {
    if let rusqlite::Error::SqliteFailure(ref inner, ref message) = err {
        match inner.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return Failure::Unique
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Failure::ForeignKey,
            // ON DELETE RESTRICT is enforced by an internal trigger.
            ffi::SQLITE_CONSTRAINT_TRIGGER
                if message
                    .as_deref()
                    .is_some_and(|m| m.contains("FOREIGN KEY constraint failed")) =>
            {
                return Failure::ForeignKey
            }
            _ => {}
        }
    }
    Failure::Other(Error::database(err.to_string()))
}
