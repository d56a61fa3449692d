// ============================================================================
// AUTHENTICATED POST SERVICE
// ============================================================================

// - Registration/login with bcrypt password hashing
// - Stateless JWT bearer authentication
// - Owner-scoped posts with a short-lived listing snapshot cache
// - Request-scoped database sessions from a bounded pool

pub mod auth;
pub mod cache;
pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod routes;
pub mod states;
pub mod store;

pub use config::Config;
pub use routes::router;
pub use states::AppState;
