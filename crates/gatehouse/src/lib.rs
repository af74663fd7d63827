//! Gatehouse library.
//!
//! Authenticates users against a pre-existing personnel registry and issues
//! signed bearer tokens for downstream authorization.

pub mod api;
pub mod auth;
pub mod db;
pub mod store;
