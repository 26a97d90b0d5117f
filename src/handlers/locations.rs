use crate::error::{ApiError, ErrorResponse};
use crate::handlers::parse_object_id;
use crate::models::{LocationBody, PathPayload, PathResponse};
use crate::routes;
use crate::state::AppState;
use crate::store::LocationMutation;
use axum::{extract::Path, extract::State, http::StatusCode, Json};

const PATH_NOT_FOUND: &str = "Path not found";
const LOCATION_NOT_FOUND: &str = "Location not found";
const COORDINATES_REQUIRED: &str = "Latitude and longitude are required";

fn require_coordinates(body: &LocationBody) -> Result<(f64, f64), ApiError> {
    match (body.lat, body.lng) {
        (Some(lat), Some(lng)) => Ok((lat, lng)),
        _ => Err(ApiError::Validation(COORDINATES_REQUIRED.to_string())),
    }
}

/// POST /api/paths/{id}/locations handler - Append a waypoint
///
/// The new location lands at the end of the sequence with order equal to
/// the previous location count. Returns the full updated path.
#[utoipa::path(
    post,
    path = routes::PATH_LOCATIONS,
    params(
        ("id" = String, Path, description = "Path document id")
    ),
    request_body = LocationBody,
    responses(
        (status = 200, description = "Location appended", body = PathResponse),
        (status = 400, description = "Malformed id or missing coordinates", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Path not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "locations"
)]
pub async fn add_location_handler(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<LocationBody>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let (lat, lng) = require_coordinates(&body)?;
    let id = parse_object_id(&id_str)?;

    match state.store.add_location(id, lat, lng).await? {
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

/// PUT /api/paths/{id}/locations/{location_id} handler - Move a waypoint
///
/// Updates latitude/longitude in place; the location's position in the
/// sequence never changes here.
#[utoipa::path(
    put,
    path = routes::PATH_LOCATION_ITEM,
    params(
        ("id" = String, Path, description = "Path document id"),
        ("location_id" = String, Path, description = "Location id within the path")
    ),
    request_body = LocationBody,
    responses(
        (status = 200, description = "Coordinates updated", body = PathResponse),
        (status = 400, description = "Malformed id or missing coordinates", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Path or location not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "locations"
)]
pub async fn update_location_handler(
    State(state): State<AppState>,
    Path((id_str, location_id_str)): Path<(String, String)>,
    Json(body): Json<LocationBody>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let (lat, lng) = require_coordinates(&body)?;
    let id = parse_object_id(&id_str)?;
    let location_id = parse_object_id(&location_id_str)?;

    match state.store.update_location(id, location_id, lat, lng).await? {
        LocationMutation::Applied(path) => Ok((
            StatusCode::OK,
            Json(PathResponse {
                success: true,
                data: PathPayload::from(&path),
                message: None,
            }),
        )),
        LocationMutation::PathMissing => Err(ApiError::NotFound(PATH_NOT_FOUND.to_string())),
        LocationMutation::LocationMissing => {
            Err(ApiError::NotFound(LOCATION_NOT_FOUND.to_string()))
        }
    }
}

/// DELETE /api/paths/{id}/locations/{location_id} handler - Remove a waypoint
///
/// The surviving locations are renumbered sequentially from zero so the
/// sequence keeps no gaps. Returns the full updated path.
#[utoipa::path(
    delete,
    path = routes::PATH_LOCATION_ITEM,
    params(
        ("id" = String, Path, description = "Path document id"),
        ("location_id" = String, Path, description = "Location id within the path")
    ),
    responses(
        (status = 200, description = "Location deleted", body = PathResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Path or location not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "locations"
)]
pub async fn delete_location_handler(
    State(state): State<AppState>,
    Path((id_str, location_id_str)): Path<(String, String)>,
) -> Result<(StatusCode, Json<PathResponse>), ApiError> {
    let id = parse_object_id(&id_str)?;
    let location_id = parse_object_id(&location_id_str)?;

    match state.store.delete_location(id, location_id).await? {
        LocationMutation::Applied(path) => Ok((
            StatusCode::OK,
            Json(PathResponse {
                success: true,
                data: PathPayload::from(&path),
                message: Some("Location deleted successfully".to_string()),
            }),
        )),
        LocationMutation::PathMissing => Err(ApiError::NotFound(PATH_NOT_FOUND.to_string())),
        LocationMutation::LocationMissing => {
            Err(ApiError::NotFound(LOCATION_NOT_FOUND.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionIssuer;
    use crate::config::Config;
    use crate::store::MongoStore;
    use axum::{
        body::Body,
        http::Request,
        routing::{post, put},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn setup_test_app() -> Router {
        let config = Config {
            mongodb_uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100&connectTimeoutMS=100"
                .to_string(),
            mongodb_database: "location-endpoint-test".to_string(),
            jwt_secret: "test-secret-at-least-32-bytes-long!!".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "test-password".to_string(),
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
        };

        let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database)
            .await
            .expect("Failed to create store handle");

        let state = AppState {
            store,
            sessions: SessionIssuer::new(&config.jwt_secret),
            config: Arc::new(config),
        };

        Router::new()
            .route(crate::routes::PATH_LOCATIONS, post(add_location_handler))
            .route(
                crate::routes::PATH_LOCATION_ITEM,
                put(update_location_handler).delete(delete_location_handler),
            )
            .with_state(state)
    }

    #[tokio::test]
    async fn test_add_location_requires_both_coordinates() {
        let app = setup_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/paths/656f1f77bcf86cd799439011/locations")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"lat": 12.5}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error_response.message, COORDINATES_REQUIRED);
    }

    #[tokio::test]
    async fn test_add_location_rejects_malformed_path_id() {
        let app = setup_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/paths/nope/locations")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"lat": 1.0, "lng": 2.0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_location_rejects_malformed_location_id() {
        let app = setup_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/paths/656f1f77bcf86cd799439011/locations/nope")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"lat": 1.0, "lng": 2.0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error_response.message.contains("Invalid identifier format"));
    }

    #[tokio::test]
    async fn test_delete_location_rejects_malformed_ids() {
        let app = setup_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/paths/656f1f77bcf86cd799439011/locations/also-nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
