//! Path utilities for media file detection and request path safety.
//!
//! The catalog only lists files whose extension is on an allow-list, and
//! every file name that arrives in a URL is checked before it is joined onto
//! a folder path.

use std::path::Path;

use crate::{Error, Result};

/// Default allow-list of media file extensions.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "m4v", "mkv", "webm", "mov", "avi"];

/// Get the default list of media file extensions.
///
/// # Examples
///
/// ```
/// use localflix_common::paths::media_extensions;
///
/// assert!(media_extensions().contains(&"mkv"));
/// assert!(media_extensions().contains(&"mp4"));
/// ```
#[must_use]
pub fn media_extensions() -> &'static [&'static str] {
    MEDIA_EXTENSIONS
}

/// Check if a path has a media file extension from the default allow-list.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use localflix_common::paths::is_media_file;
///
/// assert!(is_media_file(Path::new("movie.mkv")));
/// assert!(is_media_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_media_file(Path::new("subtitle.srt")));
/// ```
pub fn is_media_file(path: &Path) -> bool {
    has_extension(path, MEDIA_EXTENSIONS)
}

/// Check if a path's extension (case-insensitive) is in `extensions`.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// File name without its final extension.
///
/// # Examples
///
/// ```
/// use localflix_common::paths::base_name;
///
/// assert_eq!(base_name("Movie.2020.mkv"), "Movie.2020");
/// assert_eq!(base_name("noext"), "noext");
/// ```
pub fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

/// Reject file names that could escape the directory they are joined onto.
///
/// A valid name is a single, non-empty path component.
pub fn validate_file_name(name: &str) -> Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(Error::invalid_input(format!("Invalid file name: {name:?}")));
    }
    Ok(name)
}
