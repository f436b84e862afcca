//! Duration probing through ffprobe.

use serde::Deserialize;
use std::path::Path;

use crate::command::{Tool, ToolInvocation, ToolRunner};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Build the ffprobe invocation that reports the container duration.
pub fn duration_invocation(path: &Path) -> ToolInvocation {
    let mut inv = ToolInvocation::new(Tool::Ffprobe);
    inv.args_from(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path.to_string_lossy());
    inv
}

/// Probe the duration of a media file in seconds.
///
/// # Errors
///
/// Tool errors are passed through. Output without a usable duration is
/// [`Error::ParseError`].
pub async fn probe_duration(runner: &dyn ToolRunner, path: &Path) -> Result<f64> {
    let output = runner.run(duration_invocation(path)).await?;
    parse_duration(&output.stdout)
}

/// Extract `format.duration` from ffprobe's JSON output.
pub fn parse_duration(json: &str) -> Result<f64> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;

    let raw = parsed
        .format
        .duration
        .ok_or_else(|| Error::parse_error("ffprobe", "no duration in format section"))?;

    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::parse_error("ffprobe", format!("invalid duration: {raw}")))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("invalid duration: {raw}"),
        ));
    }

    Ok(seconds)
}
