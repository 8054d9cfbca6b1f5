//! Library entrypoint for the stockalert engine.
//!
//! This file exists mainly to make handler tests easy (integration tests
//! under `tests/` can import the app state, routers, services and stores).

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

pub mod feed;
pub mod store;

pub mod services;

pub mod controllers;
pub mod events;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn store::AlertStore>,
    pub feed: Arc<dyn feed::PriceFeed>,
    pub lifecycle: services::lifecycle::Lifecycle,
}
