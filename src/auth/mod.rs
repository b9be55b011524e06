use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod handlers;
mod password;
pub mod repo_types;
pub mod services;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::account_routes())
}
