//! Helpdesk ticketing API: tickets with comments and time tracking, users
//! and clients, served over axum with PostgreSQL or in-memory storage.

pub mod core;
pub mod directory;
pub mod main_module;
pub mod security;
pub mod storage;
pub mod tickets;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::state::AppState;
pub use crate::main_module::{build_router, init_app_state, run_axum_server};
