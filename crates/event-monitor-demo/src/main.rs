// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::{env, sync::Arc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use event_monitor::{logger, middleware::request_ids, Config, EventContext, Monitor};

const DEFAULT_PORT: u16 = 8080;
const HOST: &str = "0.0.0.0";

#[tokio::main]
pub async fn main() {
    let log_level = env::var("MONITOR_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_ansi(false)
        .event_format(logger::Formatter)
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error reading monitor configuration: {e}");
            return;
        }
    };

    let monitor = Arc::new(Monitor::new());
    if let Err(e) = monitor.init(config).await {
        error!("Error initializing monitor: {e}");
        return;
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let app = Router::new()
        .route("/users/{id}", get(get_user))
        .route("/health", get(health))
        .layer(from_fn_with_state(Arc::clone(&monitor), request_ids))
        .with_state(Arc::clone(&monitor));

    let listener = match tokio::net::TcpListener::bind((HOST, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {HOST}:{port}: {e}");
            return;
        }
    };

    monitor.emit(
        &EventContext::new(),
        "service.started",
        Some(json!({ "port": port })),
    );
    info!("Listening on {HOST}:{port}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    monitor.emit(&EventContext::new(), "service.stopped", None);
    monitor.flush().await;
    monitor.shutdown().await;
    info!("Shutdown complete");
}

async fn get_user(
    State(monitor): State<Arc<Monitor>>,
    Extension(ctx): Extension<EventContext>,
    Path(id): Path<String>,
) -> Json<Value> {
    let ctx = ctx.with_user_id(id.clone());
    monitor.emit(&ctx, "user.fetched", Some(json!({ "user_id": id })));
    Json(json!({ "id": id, "request_id": ctx.request_id() }))
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, flushing events");
}
