use axum::{routing::get, Router};

use crate::{events, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/events", get(events::sse_events))
}
