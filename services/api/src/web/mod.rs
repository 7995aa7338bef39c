pub mod account;
pub mod auth;
pub mod extract;
pub mod middleware;
pub mod resources;
pub mod rest;
pub mod sample_data;
pub mod shell;
pub mod state;
pub mod views;

// Re-export what the binaries need to build the server.
pub use middleware::require_auth;
pub use rest::{router, ApiDoc};
pub use state::AppState;
