//! Localflix-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across localflix:
//!
//! - **Typed IDs**: Integer newtypes for categories and folders
//! - **Core Types**: Category, folder and catalog file records
//! - **Path Utilities**: Media extension allow-list and file name checks
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use localflix_common::{FolderId, Error, Result};
//! use localflix_common::paths::is_media_file;
//! use std::path::Path;
//!
//! let folder_id: FolderId = "7".parse().unwrap();
//! assert_eq!(folder_id.get(), 7);
//!
//! assert!(is_media_file(Path::new("movie.mkv")));
//!
//! let lookup: Result<()> = Err(Error::not_found("folder", folder_id));
//! assert!(matches!(lookup, Err(Error::NotFound { .. })));
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
