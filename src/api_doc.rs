use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{
    CleanupResponse, CreatePathRequest, LocationBody, LocationInput, LocationPayload,
    LoginRequest, LoginResponse, PathListResponse, PathPayload, PathResponse,
    RegisterAdminResponse, UpdatePathRequest, UserPayload, VerifyResponse,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "path-tracker API",
        version = "1.0.0",
        description = "HTTP API for managing named paths of ordered geographic waypoints, backed by MongoDB"
    ),
    paths(
        handlers::health::health_handler,
        handlers::auth::register_admin_handler,
        handlers::auth::login_handler,
        handlers::auth::verify_handler,
        handlers::paths::list_paths_handler,
        handlers::paths::get_path_handler,
        handlers::paths::create_path_handler,
        handlers::paths::update_path_handler,
        handlers::paths::delete_path_handler,
        handlers::paths::cleanup_paths_handler,
        handlers::locations::add_location_handler,
        handlers::locations::update_location_handler,
        handlers::locations::delete_location_handler
    ),
    components(
        schemas(
            PathPayload,
            LocationPayload,
            UserPayload,
            CreatePathRequest,
            LocationInput,
            UpdatePathRequest,
            LocationBody,
            LoginRequest,
            PathListResponse,
            PathResponse,
            CleanupResponse,
            LoginResponse,
            VerifyResponse,
            RegisterAdminResponse,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "auth", description = "Admin bootstrap and session tokens"),
        (name = "paths", description = "Path CRUD operations"),
        (name = "locations", description = "Waypoint operations within a path")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
