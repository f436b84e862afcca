//! Core record types shared by the database, catalog and HTTP layers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{CategoryId, FolderId};

/// A named grouping of folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A filesystem directory registered under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    /// Absolute filesystem location.
    pub path: String,
    pub category_id: CategoryId,
}

/// A media file as returned by a catalog scan. Never persisted.
///
/// URL fields are empty strings when the corresponding derived asset is
/// not available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub name: String,
    pub path: String,
    pub url: String,
    pub subtitles_url: String,
    pub thumbnail_url: String,
    pub category_id: CategoryId,
    pub folder_id: FolderId,
    #[serde(rename = "time_length")]
    pub duration_seconds: f64,
}

/// Kind of derived asset generated from a source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Still frame extracted from the video.
    Thumbnail,
    /// First embedded subtitle track, as WebVTT.
    Subtitle,
}

impl AssetKind {
    /// All asset kinds, in generation order.
    pub const ALL: [AssetKind; 2] = [AssetKind::Thumbnail, AssetKind::Subtitle];

    /// Directory under the derived root holding this kind (`thumbnails`, `subtitles`).
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnails",
            Self::Subtitle => "subtitles",
        }
    }

    /// File extension of the materialized asset.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Thumbnail => "png",
            Self::Subtitle => "vtt",
        }
    }

    /// MIME type used when serving the asset.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Thumbnail => "image/png",
            Self::Subtitle => "text/vtt; charset=utf-8",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Subtitle => write!(f, "subtitle"),
        }
    }
}
