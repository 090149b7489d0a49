pub mod planetariums;
pub mod reservations;
pub mod show_sessions;
pub mod shows;
pub mod themes;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(themes::routes())
        .merge(planetariums::routes())
        .merge(shows::routes())
        .merge(show_sessions::routes())
        .merge(reservations::routes())
}
