use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod handlers;
pub mod provider;
pub mod types;

pub fn router() -> Router<AppState> {
    handlers::oauth_routes()
}
