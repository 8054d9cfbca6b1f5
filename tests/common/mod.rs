#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use tokio::sync::broadcast;

use stockalert::config;
use stockalert::error::AlertError;
use stockalert::feed::PriceFeed;
use stockalert::models::{Alert, AlertKind};
use stockalert::routes;
use stockalert::services::lifecycle::{Lifecycle, NewAlert};
use stockalert::services::monitor::AlertMonitor;
use stockalert::store::memory::MemoryAlertStore;
use stockalert::store::AlertStore;
use stockalert::AppState;

/// Scripted price feed. Prices are set per code; codes marked unavailable
/// error out; anything else reports no data. Lookups are counted per code.
#[derive(Default)]
pub struct FakeFeed {
    prices: Mutex<HashMap<String, f64>>,
    unavailable: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFeed {
    pub fn set_price(&self, code: &str, price: f64) {
        self.prices.lock().unwrap().insert(code.to_string(), price);
    }

    pub fn clear_price(&self, code: &str) {
        self.prices.lock().unwrap().remove(code);
    }

    pub fn set_unavailable(&self, code: &str) {
        self.unavailable.lock().unwrap().insert(code.to_string());
    }

    pub fn clear_unavailable(&self, code: &str) {
        self.unavailable.lock().unwrap().remove(code);
    }

    pub fn calls_for(&self, code: &str) -> usize {
        self.calls.lock().unwrap().get(code).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PriceFeed for FakeFeed {
    async fn latest_price(&self, code: &str) -> Result<Option<f64>, AlertError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(code.to_string())
            .or_insert(0) += 1;

        if self.unavailable.lock().unwrap().contains(code) {
            return Err(AlertError::FeedUnavailable {
                reason: "scripted outage".to_string(),
            });
        }
        Ok(self.prices.lock().unwrap().get(code).copied())
    }
}

/// Memory store that can be switched into a failing mode, for exercising the
/// scan loop's retry behavior.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryAlertStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AlertError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AlertError::StoreUnavailable {
                reason: "scripted outage".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for FlakyStore {
    async fn create(&self, alert: &Alert) -> Result<ObjectId, AlertError> {
        self.check()?;
        self.inner.create(alert).await
    }

    async fn get(&self, id: ObjectId) -> Result<Alert, AlertError> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn list_all(&self) -> Result<Vec<Alert>, AlertError> {
        self.check()?;
        self.inner.list_all().await
    }

    async fn list_by_code(&self, code: &str) -> Result<Vec<Alert>, AlertError> {
        self.check()?;
        self.inner.list_by_code(code).await
    }

    async fn list_active(&self) -> Result<Vec<Alert>, AlertError> {
        self.check()?;
        self.inner.list_active().await
    }

    async fn list_historical(&self) -> Result<Vec<Alert>, AlertError> {
        self.check()?;
        self.inner.list_historical().await
    }

    async fn update(&self, alert: &Alert) -> Result<(), AlertError> {
        self.check()?;
        self.inner.update(alert).await
    }

    async fn delete(&self, id: ObjectId) -> Result<(), AlertError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn mark_triggered(&self, id: ObjectId, price: f64, at: i64) -> Result<bool, AlertError> {
        self.check()?;
        self.inner.mark_triggered(id, price, at).await
    }

    async fn ping(&self) -> Result<(), AlertError> {
        self.check()?;
        self.inner.ping().await
    }
}

pub struct Harness {
    pub store: Arc<MemoryAlertStore>,
    pub feed: Arc<FakeFeed>,
    pub lifecycle: Lifecycle,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryAlertStore::default());
    let feed = Arc::new(FakeFeed::default());
    let (events_tx, _) = broadcast::channel(64);
    let lifecycle = Lifecycle::new(store.clone(), events_tx);
    Harness {
        store,
        feed,
        lifecycle,
    }
}

impl Harness {
    pub fn monitor(&self) -> AlertMonitor {
        AlertMonitor::new(
            self.lifecycle.clone(),
            self.feed.clone(),
            Duration::from_millis(10),
            4,
        )
    }
}

/// Harness over a flaky store, monitor included.
pub fn flaky_harness() -> (Arc<FlakyStore>, Arc<FakeFeed>, Lifecycle, AlertMonitor) {
    let store = Arc::new(FlakyStore::default());
    let feed = Arc::new(FakeFeed::default());
    let (events_tx, _) = broadcast::channel(64);
    let lifecycle = Lifecycle::new(store.clone(), events_tx);
    let monitor = AlertMonitor::new(
        lifecycle.clone(),
        feed.clone(),
        Duration::from_millis(10),
        4,
    );
    (store, feed, lifecycle, monitor)
}

pub fn new_alert(code: &str, kind: AlertKind, target_price: f64) -> NewAlert {
    NewAlert {
        code: code.to_string(),
        name: String::new(),
        kind,
        target_price,
        enabled: true,
        note: None,
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryAlertStore>,
    pub feed: Arc<FakeFeed>,
    pub lifecycle: Lifecycle,
}

pub fn test_app() -> TestApp {
    let mut settings = config::load();
    settings.finnhub_api_key = String::new();

    let store = Arc::new(MemoryAlertStore::default());
    let feed = Arc::new(FakeFeed::default());
    let (events_tx, _) = broadcast::channel(64);
    let lifecycle = Lifecycle::new(store.clone(), events_tx);

    let state = AppState {
        settings,
        store: store.clone(),
        feed: feed.clone(),
        lifecycle: lifecycle.clone(),
    };

    TestApp {
        app: routes::app(state),
        store,
        feed,
        lifecycle,
    }
}

pub async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
