pub mod dto;
pub mod features;
pub mod handlers;
pub mod repo_types;
pub mod services;
pub mod tips;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::page_routes())
        .merge(handlers::api_routes())
}
