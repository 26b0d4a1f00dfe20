pub mod dto;
pub mod handlers;
pub mod mailer;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::inquiry_routes()
}
