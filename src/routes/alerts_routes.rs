use axum::{
    routing::{get, post},
    Router,
};

use crate::{controllers::alerts_controller, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/alerts",
            get(alerts_controller::list_alerts).post(alerts_controller::create_alert),
        )
        .route("/alerts/code/:code", get(alerts_controller::list_code_alerts))
        .route(
            "/alerts/:id",
            get(alerts_controller::get_alert)
                .put(alerts_controller::update_alert)
                .delete(alerts_controller::delete_alert),
        )
        .route("/alerts/:id/enable", post(alerts_controller::enable_alert))
        .route("/alerts/:id/disable", post(alerts_controller::disable_alert))
        .route("/alerts/:id/rearm", post(alerts_controller::rearm_alert))
}
