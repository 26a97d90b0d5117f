use crate::auth::SessionIssuer;
use crate::config::Config;
use crate::store::MongoStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: MongoStore,
    pub sessions: SessionIssuer,
    pub config: Arc<Config>,
}
