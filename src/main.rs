use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mongodb::Client;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;

use stockalert::feed::finnhub::FinnhubClient;
use stockalert::services::lifecycle::Lifecycle;
use stockalert::services::monitor::AlertMonitor;
use stockalert::store::mongo::MongoAlertStore;
use stockalert::{config, routes, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();

    // Mongo connection
    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");
    let db = client.database(&settings.mongodb_db);

    let store = Arc::new(MongoAlertStore::new(db));
    if let Err(e) = store.ensure_indexes().await {
        tracing::warn!(error = %e, "index bootstrap failed; continuing without");
    }

    let feed = Arc::new(FinnhubClient::new(settings.finnhub_api_key.clone()));
    if !feed.has_key() {
        tracing::warn!("FINNHUB_API_KEY is not set; price scans will find no quotes");
    }

    let (events_tx, _) = broadcast::channel(64);
    let lifecycle = Lifecycle::new(store.clone(), events_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = AlertMonitor::new(
        lifecycle.clone(),
        feed.clone(),
        Duration::from_secs(settings.scan_interval_secs),
        settings.scan_fetch_concurrency,
    );
    let monitor_handle = monitor.spawn(shutdown_rx);

    let state = AppState {
        settings: settings.clone(),
        store,
        feed,
        lifecycle,
    };

    let app = routes::app(state);

    let addr = SocketAddr::from((
        settings.host.parse::<std::net::IpAddr>().unwrap(),
        settings.port,
    ));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Let an in-flight scan pass finish before the runtime goes away.
    let _ = shutdown_tx.send(true);
    let _ = monitor_handle.await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
