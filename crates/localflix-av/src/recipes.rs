//! ffmpeg argument recipes for the derived assets.

use std::path::Path;

use crate::command::{Tool, ToolInvocation};
use crate::Error;

/// Offset used when nothing better is known.
pub const DEFAULT_THUMBNAIL_OFFSET_SECS: f64 = 5.0;

/// Pick the seek offset for a thumbnail.
///
/// Clips shorter than `offset` are captured at half their duration. An
/// unknown duration (zero) keeps the configured offset.
pub fn thumbnail_offset(offset: f64, duration: f64) -> f64 {
    if duration > 0.0 && duration < offset {
        duration / 2.0
    } else {
        offset
    }
}

/// Extract one frame at `offset_secs` and write it to `output` as PNG.
pub fn thumbnail(source: &Path, output: &Path, offset_secs: f64) -> ToolInvocation {
    let mut inv = ToolInvocation::new(Tool::Ffmpeg);
    inv.args_from(["-hide_banner", "-loglevel", "error", "-y"])
        .arg("-ss")
        .arg(format!("{:.3}", offset_secs.max(0.0)))
        .arg("-i")
        .arg(source.to_string_lossy())
        .args_from(["-frames:v", "1", "-f", "image2", "-c:v", "png"])
        .arg(output.to_string_lossy());
    inv
}

/// Convert the first embedded subtitle stream of `source` to WebVTT.
pub fn subtitle(source: &Path, output: &Path) -> ToolInvocation {
    let mut inv = ToolInvocation::new(Tool::Ffmpeg);
    inv.args_from(["-hide_banner", "-loglevel", "error", "-y"])
        .arg("-i")
        .arg(source.to_string_lossy())
        .args_from(["-map", "0:s:0", "-c:s", "webvtt", "-f", "webvtt"])
        .arg(output.to_string_lossy());
    inv
}

/// Whether a failed subtitle extraction means the source simply has no
/// subtitle stream.
pub fn is_missing_subtitle_stream(err: &Error) -> bool {
    match err {
        Error::ToolFailed { message, .. } => {
            let message = message.to_ascii_lowercase();
            message.contains("matches no streams")
                || message.contains("output file does not contain any stream")
        }
        _ => false,
    }
}
