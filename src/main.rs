mod api_doc;
mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_doc::ApiDoc;
use auth::{AdminBootstrap, SessionIssuer};
use config::Config;
use state::AppState;
use store::MongoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("path-tracker starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = MongoStore::from_config(&config).await?;

    match auth::ensure_admin(&store, &config.admin_email, &config.admin_password).await? {
        AdminBootstrap::Created(user) => tracing::info!("Admin account created: {}", user.email),
        AdminBootstrap::Existing(user) => {
            tracing::info!("Admin account already exists: {}", user.email)
        }
    }

    let sessions = SessionIssuer::new(&config.jwt_secret);
    let addr = format!("{}:{}", config.service_host, config.service_port);
    let state = AppState {
        store,
        sessions,
        config: Arc::new(config),
    };

    let app = build_router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server terminated")?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route(routes::HEALTH, get(handlers::health_handler))
        .route(routes::AUTH_REGISTER_ADMIN, get(handlers::register_admin_handler))
        .route(routes::AUTH_LOGIN, post(handlers::login_handler))
        .route(routes::PATHS, get(handlers::list_paths_handler))
        .route(routes::PATH_ITEM, get(handlers::get_path_handler));

    // Every mutation plus token verification sits behind the session gate;
    // reads stay open for unauthenticated map clients.
    let protected = Router::new()
        .route(routes::AUTH_VERIFY, get(handlers::verify_handler))
        .route(routes::PATHS, post(handlers::create_path_handler))
        .route(
            routes::PATH_ITEM,
            put(handlers::update_path_handler).delete(handlers::delete_path_handler),
        )
        .route(routes::PATHS_CLEANUP, delete(handlers::cleanup_paths_handler))
        .route(routes::PATH_LOCATIONS, post(handlers::add_location_handler))
        .route(
            routes::PATH_LOCATION_ITEM,
            put(handlers::update_location_handler).delete(handlers::delete_location_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
