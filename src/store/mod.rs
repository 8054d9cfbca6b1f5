pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::AlertError;
use crate::models::Alert;

/// Durable alert storage. Every operation is atomic at the single-record
/// level; listings return newest-first.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create(&self, alert: &Alert) -> Result<ObjectId, AlertError>;

    async fn get(&self, id: ObjectId) -> Result<Alert, AlertError>;

    async fn list_all(&self) -> Result<Vec<Alert>, AlertError>;

    async fn list_by_code(&self, code: &str) -> Result<Vec<Alert>, AlertError>;

    /// Enabled and not yet triggered.
    async fn list_active(&self) -> Result<Vec<Alert>, AlertError>;

    /// Triggered at least once since last re-arm.
    async fn list_historical(&self) -> Result<Vec<Alert>, AlertError>;

    /// Overwrites the record's mutable fields; `id` and `created_at` are
    /// never touched. Last write wins.
    async fn update(&self, alert: &Alert) -> Result<(), AlertError>;

    async fn delete(&self, id: ObjectId) -> Result<(), AlertError>;

    /// Compare-and-swap trigger transition: writes `{enabled: false,
    /// triggered_price, triggered_at}` as one tuple iff the alert has not
    /// triggered yet. Returns `true` iff this call performed the
    /// transition; `false` means it was already triggered or no longer
    /// exists (both are benign to the scan loop).
    async fn mark_triggered(&self, id: ObjectId, price: f64, at: i64) -> Result<bool, AlertError>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), AlertError>;
}
