use crate::error::{ApiError, ErrorResponse};
use crate::handlers::parse_object_id;
use crate::models::{
    CleanupResponse, CreatePathRequest, PathListResponse, PathPayload, PathResponse,
    UpdatePathRequest,
};
use crate::routes;
use crate::state::AppState;
use crate::store::{LocationDoc, PathDoc};
use axum::{extract::Path, extract::State, http::StatusCode, Json};
use mongodb::bson::oid::ObjectId;

const PATH_NOT_FOUND: &str = "Path not found";
const NAME_REQUIRED: &str = "Path name is required";
const COORDINATES_REQUIRED: &str = "Latitude and longitude are required";

/// GET /api/paths handler - List all paths, newest first
#[utoipa::path(
    get,
    path = routes::PATHS,
    responses(
        (status = 200, description = "All paths, created-at descending", body = PathListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "paths"
)]
pub async fn list_paths_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<PathListResponse>), ApiError> {
    let paths = state.store.list_paths().await?;
    let data: Vec<PathPayload> = paths.iter().map(PathPayload::from).collect();

    Ok((StatusCode::OK, Json(PathListResponse { success: true, data })))
}

/// GET /api/paths/{id} handler - Fetch one path
#[utoipa::path(
    get,
    path = routes::PATH_ITEM,
    params(
        ("id" = String, Path, description = "Path document id")
    ),
    responses(
        (status = 200, description = "Path found", body = PathResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Path not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "paths"
)]
pub async fn get_path_handler(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let id = parse_object_id(&id_str)?;

    match state.store.get_path(id).await? {
        Some(path) => Ok((
            StatusCode::OK,
            Json(PathResponse {
                success: true,
                data: PathPayload::from(&path),
                message: None,
            }),
        )),
        None => Err(ApiError::NotFound(PATH_NOT_FOUND.to_string())),
    }
}

/// POST /api/paths handler - Create a path
///
/// Requires a non-empty name; initial locations are optional. Supplied
/// locations are ranked by their explicit `order` when present, else by
/// array position, and stored with contiguous orders from zero.
#[utoipa::path(
    post,
    path = routes::PATHS,
    request_body = CreatePathRequest,
    responses(
        (status = 201, description = "Path created", body = PathResponse),
        (status = 400, description = "Missing name or incomplete location", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "paths"
)]
pub async fn create_path_handler(
    State(state): State<AppState>,
    Json(body): Json<CreatePathRequest>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::Validation(NAME_REQUIRED.to_string()))?
        .to_string();

    let mut locations = Vec::new();
    for (index, input) in body.locations.unwrap_or_default().into_iter().enumerate() {
        let (Some(lat), Some(lng)) = (input.lat, input.lng) else {
            return Err(ApiError::Validation(COORDINATES_REQUIRED.to_string()));
        };
        locations.push(LocationDoc {
            id: ObjectId::new(),
            lat,
            lng,
            order: input.order.unwrap_or(index as u32),
        });
    }

    let path = state.store.insert_path(PathDoc::new(name, locations)).await?;
    tracing::info!("Created path {} ({})", path.id, path.name);

    Ok((
        StatusCode::CREATED,
        Json(PathResponse {
            success: true,
            data: PathPayload::from(&path),
            message: None,
        }),
    ))
}

/// PUT /api/paths/{id} handler - Rename a path
///
/// Locations are untouched by this operation.
#[utoipa::path(
    put,
    path = routes::PATH_ITEM,
    params(
        ("id" = String, Path, description = "Path document id")
    ),
    request_body = UpdatePathRequest,
    responses(
        (status = 200, description = "Path renamed", body = PathResponse),
        (status = 400, description = "Malformed id or missing name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Path not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "paths"
)]
pub async fn update_path_handler(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<UpdatePathRequest>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let id = parse_object_id(&id_str)?;
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::Validation(NAME_REQUIRED.to_string()))?;

    match state.store.rename_path(id, name).await? {
        Some(path) => Ok((
            StatusCode::OK,
            Json(PathResponse {
                success: true,
                data: PathPayload::from(&path),
                message: None,
            }),
        )),
        None => Err(ApiError::NotFound(PATH_NOT_FOUND.to_string())),
    }
}

/// DELETE /api/paths/{id} handler - Delete a path and its locations
#[utoipa::path(
    delete,
    path = routes::PATH_ITEM,
    params(
        ("id" = String, Path, description = "Path document id")
    ),
    responses(
        (status = 200, description = "Path deleted", body = PathResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Path not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "paths"
)]
pub async fn delete_path_handler(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let id = parse_object_id(&id_str)?;

    match state.store.delete_path(id).await? {
        Some(path) => Ok((
            StatusCode::OK,
            Json(PathResponse {
                success: true,
                data: PathPayload::from(&path),
                message: Some("Path deleted successfully".to_string()),
            }),
        )),
        None => Err(ApiError::NotFound(PATH_NOT_FOUND.to_string())),
    }
}

/// DELETE /api/paths/all/cleanup handler - Delete every path
///
/// Maintenance/reset only; irreversible.
#[utoipa::path(
    delete,
    path = routes::PATHS_CLEANUP,
    responses(
        (status = 200, description = "All paths deleted", body = CleanupResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "paths"
)]
pub async fn cleanup_paths_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CleanupResponse>), ApiError> {
    let deleted_count = state.store.delete_all_paths().await?;

    Ok((
        StatusCode::OK,
        Json(CleanupResponse {
            success: true,
            message: format!("Deleted {} paths", deleted_count),
            deleted_count,
        }),
    ))
}
