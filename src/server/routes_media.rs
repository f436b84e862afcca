//! Video, subtitle and thumbnail delivery.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use localflix_common::paths::{has_extension, validate_file_name};
use localflix_common::{AssetKind, Error, FolderId};

use super::{parse_id, AppContext, AppError};
use crate::streaming;

/// Create media routes.
pub fn media_routes() -> Router<AppContext> {
    Router::new()
        .route("/stream/:folder_id/:file_name", get(stream_video))
        .route("/subtitles/:folder_id/:file_name", get(get_subtitles))
        .route("/thumbnails/:folder_id/:file_name", get(get_thumbnail))
}

/// Stream a video file with range support.
async fn stream_video(
    State(ctx): State<AppContext>,
    Path((folder_id, file_name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let folder_id: FolderId = parse_id(&folder_id, "folder id")?;
    let file_name = validate_file_name(&file_name)?;
    let folder = ctx.catalog.folder(folder_id).await?;

    // A header that is not valid ASCII is malformed, not absent.
    let range = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());

    // Only files the catalog would list are streamable.
    let path = std::path::Path::new(&folder.path).join(file_name);
    if !has_extension(&path, &ctx.config.catalog.extensions) {
        return Err(Error::not_found("file", file_name).into());
    }

    let response =
        streaming::stream_file(&path, range, ctx.config.stream.buffer_size).await?;

    Ok(response)
}

async fn get_subtitles(
    State(ctx): State<AppContext>,
    Path((folder_id, file_name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    serve_asset(&ctx, AssetKind::Subtitle, &folder_id, &file_name).await
}

async fn get_thumbnail(
    State(ctx): State<AppContext>,
    Path((folder_id, file_name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    serve_asset(&ctx, AssetKind::Thumbnail, &folder_id, &file_name).await
}

/// Serve an already generated asset from the derived-asset tree.
async fn serve_asset(
    ctx: &AppContext,
    kind: AssetKind,
    folder_id: &str,
    file_name: &str,
) -> Result<Response, AppError> {
    let folder_id: FolderId = parse_id(folder_id, "folder id")?;
    let path = ctx.assets.storage().served_path(kind, folder_id, file_name)?;

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found(kind.to_string(), file_name).into());
        }
        Err(e) => return Err(Error::Io(e).into()),
    };

    Ok(([(header::CONTENT_TYPE, kind.content_type())], data).into_response())
}
