//! Localflix-AV: external media tool integration.
//!
//! This crate owns every interaction with `ffmpeg` and `ffprobe`:
//!
//! - **Runner**: [`ToolRunner`] trait and the subprocess-backed
//!   [`ProcessToolRunner`] (concurrency limit, timeout, kill on expiry)
//! - **Recipes**: argument lists for thumbnail and WebVTT subtitle extraction
//! - **Probe**: container duration via ffprobe JSON output
//! - **Tools**: availability checks and path resolution
//!
//! # Example
//!
//! ```no_run
//! use localflix_av::{probe, ProcessToolRunner};
//! use std::path::Path;
//!
//! # async fn example() -> localflix_av::Result<()> {
//! let runner = ProcessToolRunner::default();
//! let seconds = probe::probe_duration(&runner, Path::new("/media/movie.mkv")).await?;
//! println!("{seconds}s");
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod probe;
pub mod recipes;
pub mod tools;

pub use command::{ProcessToolRunner, Tool, ToolInvocation, ToolOutput, ToolPaths, ToolRunner};
pub use error::{Error, Result};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};
