// Route path constants - single source of truth for all API paths

pub const HEALTH: &str = "/health";

pub const AUTH_REGISTER_ADMIN: &str = "/api/auth/register-admin";
pub const AUTH_LOGIN: &str = "/api/auth/login";
pub const AUTH_VERIFY: &str = "/api/auth/verify";

pub const PATHS: &str = "/api/paths";
pub const PATH_ITEM: &str = "/api/paths/{id}";
pub const PATHS_CLEANUP: &str = "/api/paths/all/cleanup";
pub const PATH_LOCATIONS: &str = "/api/paths/{id}/locations";
pub const PATH_LOCATION_ITEM: &str = "/api/paths/{id}/locations/{location_id}";
