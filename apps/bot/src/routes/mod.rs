pub mod health;
pub mod status;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(health::router()).merge(status::router())
}
