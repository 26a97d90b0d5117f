use serde::{Deserialize, Serialize};

use crate::store::{LocationDoc, PathDoc, UserDoc};

/// One waypoint as it appears in JSON payloads
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LocationPayload {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub order: u32,
}

/// A full path document as it appears in JSON payloads
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathPayload {
    pub id: String,
    pub name: String,
    pub locations: Vec<LocationPayload>,
    pub created_at: String,
    pub updated_at: String,
}

/// Account identity returned by auth endpoints
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserPayload {
    pub id: String,
    pub email: String,
}

impl From<&LocationDoc> for LocationPayload {
    fn from(location: &LocationDoc) -> Self {
        LocationPayload {
            id: location.id.to_hex(),
            lat: location.lat,
            lng: location.lng,
            order: location.order,
        }
    }
}

impl From<&PathDoc> for PathPayload {
    fn from(path: &PathDoc) -> Self {
        PathPayload {
            id: path.id.to_hex(),
            name: path.name.clone(),
            locations: path.locations.iter().map(LocationPayload::from).collect(),
            created_at: path.created_at.to_chrono().to_rfc3339(),
            updated_at: path.updated_at.to_chrono().to_rfc3339(),
        }
    }
}

impl From<&UserDoc> for UserPayload {
    fn from(user: &UserDoc) -> Self {
        UserPayload {
            id: user.id.to_hex(),
            email: user.email.clone(),
        }
    }
}

/// Request body for POST /api/paths
///
/// All fields are optional at the serde layer so that missing values surface
/// as 400 validation responses instead of body-rejection errors.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePathRequest {
    pub name: Option<String>,
    pub locations: Option<Vec<LocationInput>>,
}

/// One waypoint supplied at path creation
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LocationInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub order: Option<u32>,
}

/// Request body for PUT /api/paths/{id}
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePathRequest {
    pub name: Option<String>,
}

/// Request body for location append/update
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LocationBody {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Request body for POST /api/auth/login
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response type for the path list endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct PathListResponse {
    pub success: bool,
    pub data: Vec<PathPayload>,
}

/// Response type for endpoints returning one path document
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct PathResponse {
    pub success: bool,
    pub data: PathPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response type for the bulk-delete endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: u64,
}

/// Response type for POST /api/auth/login
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserPayload,
}

/// Response type for GET /api/auth/verify
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: UserPayload,
}

/// Response type for GET /api/auth/register-admin
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegisterAdminResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: UserPayload,
}
