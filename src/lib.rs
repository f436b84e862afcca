//! Localflix - personal media library server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod assets;
pub mod catalog;
pub mod config;
pub mod library;
pub mod server;
pub mod streaming;
