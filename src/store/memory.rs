use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::AlertError;
use crate::models::Alert;
use crate::store::AlertStore;

/// In-process store with the same semantics as the Mongo adapter. Used by
/// the test suite; also the simplest executable description of what the
/// store contract means.
#[derive(Default)]
pub struct MemoryAlertStore {
    // Insertion order; listings iterate in reverse for newest-first.
    alerts: Mutex<Vec<Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, keep: impl Fn(&Alert) -> bool) -> Vec<Alert> {
        let alerts = self.alerts.lock().unwrap();
        alerts.iter().rev().filter(|a| keep(a)).cloned().collect()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn create(&self, alert: &Alert) -> Result<ObjectId, AlertError> {
        let mut alerts = self.alerts.lock().unwrap();
        alerts.push(alert.clone());
        Ok(alert.id)
    }

    async fn get(&self, id: ObjectId) -> Result<Alert, AlertError> {
        let alerts = self.alerts.lock().unwrap();
        alerts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(AlertError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<Alert>, AlertError> {
        Ok(self.filtered(|_| true))
    }

    async fn list_by_code(&self, code: &str) -> Result<Vec<Alert>, AlertError> {
        Ok(self.filtered(|a| a.code == code))
    }

    async fn list_active(&self) -> Result<Vec<Alert>, AlertError> {
        Ok(self.filtered(|a| a.enabled && a.triggered_at.is_none()))
    }

    async fn list_historical(&self) -> Result<Vec<Alert>, AlertError> {
        Ok(self.filtered(|a| a.triggered_at.is_some()))
    }

    async fn update(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut alerts = self.alerts.lock().unwrap();
        match alerts.iter_mut().find(|a| a.id == alert.id) {
            Some(slot) => {
                *slot = alert.clone();
                Ok(())
            }
            None => Err(AlertError::NotFound),
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<(), AlertError> {
        let mut alerts = self.alerts.lock().unwrap();
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        if alerts.len() == before {
            return Err(AlertError::NotFound);
        }
        Ok(())
    }

    async fn mark_triggered(&self, id: ObjectId, price: f64, at: i64) -> Result<bool, AlertError> {
        // Single lock scope makes the check-then-set atomic, mirroring the
        // Mongo adapter's filtered update_one.
        let mut alerts = self.alerts.lock().unwrap();
        let Some(alert) = alerts.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        if alert.triggered_at.is_some() {
            return Ok(false);
        }
        alert.enabled = false;
        alert.triggered_price = Some(price);
        alert.triggered_at = Some(at);
        Ok(true)
    }

    async fn ping(&self) -> Result<(), AlertError> {
        Ok(())
    }
}
