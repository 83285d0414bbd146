use crate::state::AppState;
use axum::Router;

pub mod avatar;
pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod validation;

/// Account routes, mounted under `/api/users`.
pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
