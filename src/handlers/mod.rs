pub mod auth;
pub mod health;
pub mod locations;
pub mod paths;

pub use auth::{login_handler, register_admin_handler, verify_handler};
pub use health::health_handler;
pub use locations::{add_location_handler, delete_location_handler, update_location_handler};
pub use paths::{
    cleanup_paths_handler, create_path_handler, delete_path_handler, get_path_handler,
    list_paths_handler, update_path_handler,
};

use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;

/// Parse a document id path parameter, rejecting malformed values with 400
/// before any store round-trip.
pub(crate) fn parse_object_id(value: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::InvalidId(value.to_string()))
}
