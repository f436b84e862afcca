//! Category, folder and catalog routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use localflix_common::{Category, CategoryId, Folder, FolderId, MediaFile};
use serde::Deserialize;

use super::{parse_id, AppContext, AppError};

/// Create library routes.
pub fn library_routes() -> Router<AppContext> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(rename_category).delete(delete_category))
        .route("/folders", post(create_folder))
        .route("/folders/:id", get(list_folders).delete(delete_folder))
        .route("/files/:folder_id", get(list_files))
}

/// Request body for creating or renaming a category.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// Request body for registering a folder.
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub path: String,
    pub category_id: CategoryId,
}

async fn list_categories(State(ctx): State<AppContext>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(ctx.library.list_categories().await?))
}

async fn create_category(
    State(ctx): State<AppContext>,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = ctx.library.create_category(&request.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn rename_category(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let id: CategoryId = parse_id(&id, "category id")?;
    Ok(Json(ctx.library.rename_category(id, &request.name).await?))
}

async fn delete_category(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CategoryId = parse_id(&id, "category id")?;
    ctx.library.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /folders/{categoryId}`: folders registered under a category.
async fn list_folders(
    State(ctx): State<AppContext>,
    Path(category_id): Path<String>,
) -> Result<Json<Vec<Folder>>, AppError> {
    let category_id: CategoryId = parse_id(&category_id, "category id")?;
    Ok(Json(ctx.library.list_folders_by_category(category_id).await?))
}

async fn create_folder(
    State(ctx): State<AppContext>,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), AppError> {
    let folder = ctx
        .library
        .create_folder(std::path::Path::new(&request.path), request.category_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

async fn delete_folder(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: FolderId = parse_id(&id, "folder id")?;
    ctx.library.delete_folder(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_files(
    State(ctx): State<AppContext>,
    Path(folder_id): Path<String>,
) -> Result<Json<Vec<MediaFile>>, AppError> {
    let folder_id: FolderId = parse_id(&folder_id, "folder id")?;
    Ok(Json(ctx.catalog.list_files(folder_id).await?))
}
