use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AlertError,
    models::{Alert, AlertState},
    services::distance::percent_distance,
    services::lifecycle::{AlertUpdate, NewAlert},
    AppState,
};

fn parse_id(id: &str) -> Result<ObjectId, AlertError> {
    ObjectId::parse_str(id).map_err(|_| AlertError::invalid("invalid alert id"))
}

fn alert_json(a: &Alert) -> serde_json::Value {
    json!({
        "id": a.id.to_hex(),
        "code": a.code,
        "name": a.name,
        "kind": a.kind,
        "target_price": a.target_price,
        "enabled": a.enabled,
        "state": a.state(),
        "note": a.note,
        "created_at": a.created_at,
        "triggered_price": a.triggered_price,
        "triggered_at": a.triggered_at,
    })
}

// POST /alerts
pub async fn create_alert(
    State(state): State<AppState>,
    Json(req): Json<NewAlert>,
) -> Result<Response, AlertError> {
    let alert = state.lifecycle.create(req).await?;
    Ok((StatusCode::CREATED, Json(alert_json(&alert))).into_response())
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub state: Option<String>,
}

// GET /alerts?state=active|suspended|historical|all
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, AlertError> {
    let filter = match q.state.as_deref() {
        None | Some("all") => None,
        Some("active") => Some(AlertState::Active),
        Some("suspended") => Some(AlertState::Suspended),
        Some("historical") => Some(AlertState::Historical),
        Some(other) => {
            return Err(AlertError::invalid(format!("unknown state filter: {other}")));
        }
    };

    let alerts = state.lifecycle.list(filter).await?;
    let items: Vec<serde_json::Value> = alerts.iter().map(alert_json).collect();
    Ok(Json(json!({ "alerts": items })).into_response())
}

// GET /alerts/:id
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AlertError> {
    let oid = parse_id(&id)?;
    let alert = state.lifecycle.get(oid).await?;
    Ok(Json(alert_json(&alert)).into_response())
}

// PUT /alerts/:id
pub async fn update_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<AlertUpdate>,
) -> Result<Response, AlertError> {
    let oid = parse_id(&id)?;
    let alert = state.lifecycle.update(oid, patch).await?;
    Ok(Json(alert_json(&alert)).into_response())
}

// POST /alerts/:id/enable
pub async fn enable_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AlertError> {
    let oid = parse_id(&id)?;
    let alert = state.lifecycle.set_enabled(oid, true).await?;
    Ok(Json(alert_json(&alert)).into_response())
}

// POST /alerts/:id/disable
pub async fn disable_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AlertError> {
    let oid = parse_id(&id)?;
    let alert = state.lifecycle.set_enabled(oid, false).await?;
    Ok(Json(alert_json(&alert)).into_response())
}

// POST /alerts/:id/rearm
pub async fn rearm_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AlertError> {
    let oid = parse_id(&id)?;
    let alert = state.lifecycle.re_enable(oid).await?;
    Ok(Json(alert_json(&alert)).into_response())
}

// DELETE /alerts/:id
pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AlertError> {
    let oid = parse_id(&id)?;
    state.lifecycle.delete(oid).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// GET /alerts/code/:code
//
// Lists one security's alerts, annotated with the latest quote and each
// alert's percent distance from it. Feed trouble degrades to a null quote
// instead of failing the listing.
pub async fn list_code_alerts(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AlertError> {
    let code = code.trim().to_uppercase();
    let alerts = state.lifecycle.list_by_code(&code).await?;

    let current_price = match state.feed.latest_price(&code).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(code, error = %e, "quote lookup failed for listing");
            None
        }
    };

    let items: Vec<serde_json::Value> = alerts
        .iter()
        .map(|a| {
            let mut v = alert_json(a);
            v["distance_pct"] = match current_price {
                Some(p) => json!(percent_distance(a, p)),
                None => serde_json::Value::Null,
            };
            v
        })
        .collect();

    Ok(Json(json!({
        "code": code,
        "current_price": current_price,
        "alerts": items,
    }))
    .into_response())
}
