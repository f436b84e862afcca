//! Localflix-DB: Database schema, migrations, and query operations
//!
//! This crate stores the category and folder metadata for localflix using
//! SQLite with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use localflix_db::pool::{init_pool, get_conn};
//! use localflix_db::queries::categories;
//!
//! let pool = init_pool("/var/lib/localflix/localflix.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let category = categories::create_category(&conn, "Movies").unwrap();
//! println!("Created category: {}", category.name);
//! ```

pub mod migrations;
pub mod pool;
pub mod queries;
