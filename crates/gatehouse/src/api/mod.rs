//! HTTP API module.
//!
//! Thin boundary over the authentication core: routing, request/response
//! shaping, and cookie handling.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
