// StudioScript Server State
// Copyright (c) 2026 StudioScript

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::agent::openrouter_bridge::OpenRouterBridge;
use crate::config::StudioConfig;

/// State shared by the function handlers. The credential comes from the
/// server environment only, never from the request.
pub struct ServerState {
    pub config: StudioConfig,
    pub bridge: OpenRouterBridge,
    pub started: Instant,
    pub served: AtomicU64,
    pub failed: AtomicU64,
}

impl ServerState {
    pub fn new(config: StudioConfig) -> Self {
        let bridge = OpenRouterBridge::new(&config, config.api_key.clone());
        Self {
            config,
            bridge,
            started: Instant::now(),
            served: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, ok: bool) {
        if ok {
            self.served.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            model: self.bridge.model().to_string(),
            credential: self.bridge.has_key(),
            uptime_secs: self.started.elapsed().as_secs(),
            served: self.served.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub credential: bool,
    pub uptime_secs: u64,
    pub served: u64,
    pub failed: u64,
}
