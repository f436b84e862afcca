//! Derived assets: thumbnails and WebVTT subtitles generated on demand.
//!
//! [`AssetStorage`] owns the on-disk layout and [`DerivedAssetCache`] owns
//! generation: existence check, single-flight per key, and atomic publish.

mod cache;
mod storage;

pub use cache::{AssetKey, AssetResult, DerivedAssetCache};
pub use storage::AssetStorage;

use std::time::Duration;

use localflix_common::FolderId;

/// Failure while generating a derived asset.
///
/// Cloneable so that every caller waiting on the same generation receives
/// the same error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} timed out after {timeout:?}")]
    ToolTimeout { tool: String, timeout: Duration },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("asset I/O error: {0}")]
    Io(String),

    /// The folder's asset directory is gone, usually because the folder was
    /// deleted while the asset was being generated.
    #[error("asset directory of folder {0} does not exist")]
    FolderRemoved(FolderId),

    /// The generation task ended without reporting a result.
    #[error("asset generation was aborted")]
    Aborted,
}

impl From<localflix_av::Error> for AssetError {
    fn from(err: localflix_av::Error) -> Self {
        match err {
            localflix_av::Error::ToolNotFound { tool } => Self::ToolNotFound { tool },
            localflix_av::Error::ToolTimeout { tool, timeout } => {
                Self::ToolTimeout { tool, timeout }
            }
            localflix_av::Error::ToolFailed { tool, message }
            | localflix_av::Error::ParseError { tool, message } => {
                Self::ToolFailed { tool, message }
            }
            localflix_av::Error::Io(e) => Self::Io(e.to_string()),
            localflix_av::Error::Json(e) => Self::ToolFailed {
                tool: "ffprobe".to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
