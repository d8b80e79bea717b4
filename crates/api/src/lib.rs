//! Minimal HTTP health/status surface for the indexing engine.

pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
