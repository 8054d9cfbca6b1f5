use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::error::AlertError;
use crate::models::{Alert, AlertKind, AlertState, TriggerEvent};
use crate::store::AlertStore;

/// Creation payload. `enabled` defaults to true so a plain
/// `{code, kind, target_price}` request arms the alert immediately.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAlert {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub kind: AlertKind,
    pub target_price: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_enabled() -> bool {
    true
}

/// Partial update; absent fields keep their stored value. Sending an empty
/// `note` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertUpdate {
    pub name: Option<String>,
    pub note: Option<String>,
    pub target_price: Option<f64>,
    pub kind: Option<AlertKind>,
}

/// Owns every alert write. Controllers and the scan loop both go through
/// here, so the state tuple (`enabled`, `triggered_price`, `triggered_at`)
/// only ever moves along the legal transitions.
#[derive(Clone)]
pub struct Lifecycle {
    store: Arc<dyn AlertStore>,
    events_tx: broadcast::Sender<TriggerEvent>,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn AlertStore>, events_tx: broadcast::Sender<TriggerEvent>) -> Self {
        Self { store, events_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.events_tx.subscribe()
    }

    pub async fn create(&self, req: NewAlert) -> Result<Alert, AlertError> {
        let code = req.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(AlertError::invalid("code must not be blank"));
        }
        validate_target(req.target_price)?;

        let alert = Alert {
            id: ObjectId::new(),
            code,
            name: req.name.trim().to_string(),
            kind: req.kind,
            target_price: req.target_price,
            enabled: req.enabled,
            note: normalize_note(req.note),
            created_at: Utc::now().timestamp(),
            triggered_price: None,
            triggered_at: None,
        };

        self.store.create(&alert).await?;
        tracing::info!(
            id = %alert.id,
            code = %alert.code,
            kind = alert.kind.as_str(),
            target = alert.target_price,
            enabled = alert.enabled,
            "alert created"
        );
        Ok(alert)
    }

    pub async fn update(&self, id: ObjectId, patch: AlertUpdate) -> Result<Alert, AlertError> {
        let mut alert = self.store.get(id).await?;

        if let Some(target) = patch.target_price {
            validate_target(target)?;
            alert.target_price = target;
        }
        if let Some(kind) = patch.kind {
            alert.kind = kind;
        }
        if let Some(name) = patch.name {
            alert.name = name.trim().to_string();
        }
        if let Some(note) = patch.note {
            alert.note = normalize_note(Some(note));
        }

        self.store.update(&alert).await?;
        Ok(alert)
    }

    /// Suspended <-> Active. A historical alert cannot be flipped here; that
    /// would leave a trigger tuple behind an enabled record.
    pub async fn set_enabled(&self, id: ObjectId, enabled: bool) -> Result<Alert, AlertError> {
        let mut alert = self.store.get(id).await?;
        if alert.state() == AlertState::Historical {
            return Err(AlertError::InvalidTransition {
                reason: "historical alerts must be re-armed, not enabled".to_string(),
            });
        }

        alert.enabled = enabled;
        self.store.update(&alert).await?;
        Ok(alert)
    }

    /// Historical -> Active: clears the trigger tuple and enables the alert.
    pub async fn re_enable(&self, id: ObjectId) -> Result<Alert, AlertError> {
        let mut alert = self.store.get(id).await?;
        if alert.state() != AlertState::Historical {
            return Err(AlertError::InvalidTransition {
                reason: "only historical alerts can be re-armed".to_string(),
            });
        }

        alert.enabled = true;
        alert.triggered_price = None;
        alert.triggered_at = None;
        self.store.update(&alert).await?;
        tracing::info!(id = %alert.id, code = %alert.code, "alert re-armed");
        Ok(alert)
    }

    pub async fn delete(&self, id: ObjectId) -> Result<(), AlertError> {
        self.store.delete(id).await
    }

    /// Records the Active -> Historical transition for a met condition.
    /// Returns true iff this call performed it. The store-level compare-and-
    /// set makes the transition happen at most once per arm cycle: a caller
    /// racing against another scan (or a just-completed trigger) gets false
    /// and emits nothing.
    pub async fn condition_met(
        &self,
        alert: &Alert,
        price: f64,
        at: i64,
    ) -> Result<bool, AlertError> {
        let transitioned = self.store.mark_triggered(alert.id, price, at).await?;
        if transitioned {
            tracing::info!(
                id = %alert.id,
                code = %alert.code,
                kind = alert.kind.as_str(),
                target = alert.target_price,
                price,
                "alert triggered"
            );
            // Nobody listening is fine; the transition is already durable.
            let _ = self.events_tx.send(TriggerEvent {
                alert_id: alert.id,
                code: alert.code.clone(),
                price,
                at,
            });
        }
        Ok(transitioned)
    }

    pub async fn get(&self, id: ObjectId) -> Result<Alert, AlertError> {
        self.store.get(id).await
    }

    pub async fn list(&self, state: Option<AlertState>) -> Result<Vec<Alert>, AlertError> {
        match state {
            None => self.store.list_all().await,
            Some(AlertState::Active) => self.store.list_active().await,
            Some(AlertState::Historical) => self.store.list_historical().await,
            Some(AlertState::Suspended) => {
                let mut all = self.store.list_all().await?;
                all.retain(|a| a.state() == AlertState::Suspended);
                Ok(all)
            }
        }
    }

    pub async fn list_by_code(&self, code: &str) -> Result<Vec<Alert>, AlertError> {
        self.store.list_by_code(&code.trim().to_uppercase()).await
    }

    pub async fn list_active(&self) -> Result<Vec<Alert>, AlertError> {
        self.store.list_active().await
    }
}

fn validate_target(target: f64) -> Result<(), AlertError> {
    if !target.is_finite() || target <= 0.0 {
        return Err(AlertError::invalid(
            "target_price must be a finite, positive number",
        ));
    }
    Ok(())
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
