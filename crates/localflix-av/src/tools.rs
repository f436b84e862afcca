//! External tool detection.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::command::{Tool, ToolPaths};
use crate::{Error, Result};

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// First line of the tool's version banner.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check whether a tool runs and report its version.
///
/// ffmpeg and ffprobe print their banner for `-version`.
///
/// # Example
///
/// ```no_run
/// use localflix_av::check_tool;
/// use std::path::Path;
///
/// let info = check_tool("ffprobe", Path::new("ffprobe"));
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, program: &Path) -> ToolInfo {
    let result = Command::new(program).arg("-version").output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: which::which(program).ok(),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check every tool localflix depends on.
pub fn check_tools(paths: &ToolPaths) -> Vec<ToolInfo> {
    [Tool::Ffmpeg, Tool::Ffprobe]
        .into_iter()
        .map(|tool| check_tool(tool.name(), paths.path(tool)))
        .collect()
}

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(tool: Tool, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            tool = %tool,
            path = %path.display(),
            "Configured tool path does not exist, falling back to PATH"
        );
    }

    require_tool(tool.name())
}

/// Resolve both tool paths, keeping the bare name for tools that cannot be
/// found so the failure surfaces per invocation instead of at startup.
pub fn resolve_tool_paths(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> ToolPaths {
    let resolve = |tool: Tool, configured: Option<&Path>| {
        get_tool_path(tool, configured).unwrap_or_else(|_| PathBuf::from(tool.name()))
    };

    ToolPaths {
        ffmpeg: resolve(Tool::Ffmpeg, ffmpeg),
        ffprobe: resolve(Tool::Ffprobe, ffprobe),
    }
}
