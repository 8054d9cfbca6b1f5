use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, doc};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::error::AlertError;
use crate::models::Alert;
use crate::store::AlertStore;

const COLLECTION: &str = "alerts";

/// Production store, one document per alert in the `alerts` collection.
#[derive(Clone)]
pub struct MongoAlertStore {
    db: Database,
}

impl MongoAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn alerts(&self) -> Collection<Alert> {
        self.db.collection::<Alert>(COLLECTION)
    }

    fn newest_first() -> FindOptions {
        FindOptions::builder().sort(doc! { "created_at": -1 }).build()
    }

    /// Indexes backing the scan (active alerts grouped by code) and the
    /// per-code listing. Safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<(), AlertError> {
        let col = self.db.collection::<mongodb::bson::Document>(COLLECTION);

        let scan = IndexModel::builder()
            .keys(doc! { "triggered_at": 1, "enabled": 1, "code": 1 })
            .build();
        col.create_index(scan, None).await.map_err(store_err)?;

        let listing = IndexModel::builder()
            .keys(doc! { "code": 1, "created_at": -1 })
            .build();
        col.create_index(listing, None).await.map_err(store_err)?;

        Ok(())
    }

    async fn collect(
        &self,
        filter: mongodb::bson::Document,
    ) -> Result<Vec<Alert>, AlertError> {
        let mut cursor = self
            .alerts()
            .find(filter, Self::newest_first())
            .await
            .map_err(store_err)?;

        let mut items = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res.map_err(store_err)?);
        }
        Ok(items)
    }
}

fn store_err(e: mongodb::error::Error) -> AlertError {
    AlertError::StoreUnavailable {
        reason: e.to_string(),
    }
}

fn opt_string(v: &Option<String>) -> Bson {
    match v {
        Some(s) => Bson::String(s.clone()),
        None => Bson::Null,
    }
}

fn opt_f64(v: Option<f64>) -> Bson {
    match v {
        Some(x) => Bson::Double(x),
        None => Bson::Null,
    }
}

fn opt_i64(v: Option<i64>) -> Bson {
    match v {
        Some(x) => Bson::Int64(x),
        None => Bson::Null,
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn create(&self, alert: &Alert) -> Result<ObjectId, AlertError> {
        self.alerts()
            .insert_one(alert, None)
            .await
            .map_err(store_err)?;
        Ok(alert.id)
    }

    async fn get(&self, id: ObjectId) -> Result<Alert, AlertError> {
        self.alerts()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(store_err)?
            .ok_or(AlertError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<Alert>, AlertError> {
        self.collect(doc! {}).await
    }

    async fn list_by_code(&self, code: &str) -> Result<Vec<Alert>, AlertError> {
        self.collect(doc! { "code": code }).await
    }

    async fn list_active(&self) -> Result<Vec<Alert>, AlertError> {
        self.collect(doc! { "enabled": true, "triggered_at": Bson::Null })
            .await
    }

    async fn list_historical(&self) -> Result<Vec<Alert>, AlertError> {
        self.collect(doc! { "triggered_at": { "$ne": Bson::Null } })
            .await
    }

    async fn update(&self, alert: &Alert) -> Result<(), AlertError> {
        let res = self
            .alerts()
            .update_one(
                doc! { "_id": alert.id },
                doc! { "$set": {
                    "code": &alert.code,
                    "name": &alert.name,
                    "kind": alert.kind.as_str(),
                    "target_price": alert.target_price,
                    "enabled": alert.enabled,
                    "note": opt_string(&alert.note),
                    "triggered_price": opt_f64(alert.triggered_price),
                    "triggered_at": opt_i64(alert.triggered_at),
                }},
                None,
            )
            .await
            .map_err(store_err)?;

        if res.matched_count == 0 {
            return Err(AlertError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<(), AlertError> {
        let res = self
            .alerts()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(store_err)?;

        if res.deleted_count == 0 {
            return Err(AlertError::NotFound);
        }
        Ok(())
    }

    async fn mark_triggered(&self, id: ObjectId, price: f64, at: i64) -> Result<bool, AlertError> {
        // The filter is the CAS: only a not-yet-triggered record matches,
        // so a concurrent duplicate sees matched_count == 0.
        let res = self
            .alerts()
            .update_one(
                doc! { "_id": id, "triggered_at": Bson::Null },
                doc! { "$set": {
                    "enabled": false,
                    "triggered_price": price,
                    "triggered_at": at,
                }},
                None,
            )
            .await
            .map_err(store_err)?;

        Ok(res.matched_count > 0)
    }

    async fn ping(&self) -> Result<(), AlertError> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
