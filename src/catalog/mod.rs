mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::Catalog;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::read_routes())
}
