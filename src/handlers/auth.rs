use crate::auth::{self, AdminBootstrap, Claims, INVALID_CREDENTIALS};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{LoginRequest, LoginResponse, RegisterAdminResponse, UserPayload, VerifyResponse};
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use mongodb::bson::oid::ObjectId;

const INVALID_TOKEN: &str = "Invalid or expired token";

/// GET /api/auth/register-admin handler - One-time admin bootstrap
///
/// Idempotent: the first call creates the administrative account (from the
/// configured credential) and returns a fresh token; later calls report that
/// the account already exists without creating a duplicate.
#[utoipa::path(
    get,
    path = routes::AUTH_REGISTER_ADMIN,
    responses(
        (status = 200, description = "Admin account created or already present", body = RegisterAdminResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_admin_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RegisterAdminResponse>), ApiError> {
    let outcome = auth::ensure_admin(
        &state.store,
        &state.config.admin_email,
        &state.config.admin_password,
    )
    .await?;

    let response = match outcome {
        AdminBootstrap::Existing(user) => RegisterAdminResponse {
            success: true,
            message: "Admin already exists".to_string(),
            token: None,
            user: UserPayload::from(&user),
        },
        AdminBootstrap::Created(user) => {
            tracing::info!("Admin account created: {}", user.email);
            let token = state.sessions.issue(&user.id.to_hex(), &user.email)?;
            RegisterAdminResponse {
                success: true,
                message: "Admin user created successfully".to_string(),
                token: Some(token),
                user: UserPayload::from(&user),
            }
        }
    };

    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/auth/login handler - Exchange credentials for a session token
///
/// Unknown email and wrong password produce the identical 401 response, so
/// the endpoint leaks no account-enumeration signal.
#[utoipa::path(
    post,
    path = routes::AUTH_LOGIN,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let (email, password) = match (body.email, body.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(ApiError::Validation(
                "Please provide email and password".to_string(),
            ));
        }
    };

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Auth(INVALID_CREDENTIALS.to_string()))?;

    if !auth::verify_password(&password, &user.password)? {
        return Err(ApiError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.sessions.issue(&user.id.to_hex(), &user.email)?;
    tracing::info!("Login succeeded for {}", user.email);

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token,
            user: UserPayload::from(&user),
        }),
    ))
}

/// GET /api/auth/verify handler - Resolve a token to its account
///
/// Runs behind the auth middleware; the claims arrive via request
/// extensions. The account is re-read from the store so a token for a
/// deleted account stops working immediately.
#[utoipa::path(
    get,
    path = routes::AUTH_VERIFY,
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, malformed, or expired token", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<VerifyResponse>), ApiError> {
    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Auth(INVALID_TOKEN.to_string()))?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Auth(INVALID_CREDENTIALS.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(VerifyResponse {
            success: true,
            user: UserPayload::from(&user),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionIssuer;
    use crate::config::Config;
    use crate::store::MongoStore;
    use axum::{body::Body, http::Request, routing::get, routing::post, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret-at-least-32-bytes-long!!";

    async fn setup_test_state() -> AppState {
        let config = Config {
            mongodb_uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100&connectTimeoutMS=100"
                .to_string(),
            mongodb_database: "auth-endpoint-test".to_string(),
            jwt_secret: TEST_SECRET.to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "test-password".to_string(),
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
        };

        let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database)
            .await
            .expect("Failed to create store handle");

        AppState {
            store,
            sessions: SessionIssuer::new(&config.jwt_secret),
            config: Arc::new(config),
        }
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let state = setup_test_state().await;
        let app = Router::new()
            .route(crate::routes::AUTH_LOGIN, post(login_handler))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email": "admin@example.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(!error_response.success);
        assert_eq!(error_response.message, "Please provide email and password");
    }

    #[tokio::test]
    async fn test_login_blank_email_rejected() {
        let state = setup_test_state().await;
        let app = Router::new()
            .route(crate::routes::AUTH_LOGIN, post(login_handler))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email": "  ", "password": "pw"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_token() {
        let state = setup_test_state().await;
        let app = Router::new()
            .route(crate::routes::AUTH_VERIFY, get(verify_handler))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::auth::require_auth,
            ))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/verify")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verify_rejects_token_with_malformed_subject() {
        let state = setup_test_state().await;
        let sessions = state.sessions.clone();
        let app = Router::new()
            .route(crate::routes::AUTH_VERIFY, get(verify_handler))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::auth::require_auth,
            ))
            .with_state(state);

        // Signature is valid but the subject is not a document id; the
        // handler must fail closed before any store lookup.
        let token = sessions.issue("not-an-object-id", "admin@example.com").unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/verify")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error_response.message, INVALID_TOKEN);
    }
}
