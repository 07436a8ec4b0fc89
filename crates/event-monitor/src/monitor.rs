// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Application-facing entry point: configuration, emit and lifecycle.

use crate::config::Config;
use crate::context::EventContext;
use crate::error::MonitorError;
use crate::event::Event;
use crate::shipper::{Shipper, Transport};
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error};

#[derive(Default)]
struct State {
    config: Option<Arc<Config>>,
    shipper: Option<Arc<Shipper>>,
}

/// Routes events to stdout and, when an ingest URL is configured, to a [`Shipper`].
///
/// Emitting before [`Monitor::init`] is a silent no-op.
#[derive(Default)]
pub struct Monitor {
    state: RwLock<State>,
    // Serializes init/shutdown so only one shipper is ever live
    lifecycle: Mutex<()>,
}

impl Monitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config`, stops any running shipper, and starts a new one
    /// when `config.ingest_url` is set.
    pub async fn init(&self, config: Config) -> Result<(), MonitorError> {
        config.validate()?;
        let config = Arc::new(config.with_defaults());
        let shipper = if config.ingest_url.is_some() {
            Some(Shipper::new(Arc::clone(&config))?)
        } else {
            None
        };
        self.install(config, shipper).await;
        Ok(())
    }

    /// Like [`Monitor::init`], but ships through `transport` regardless of `ingest_url`.
    pub async fn init_with_transport(
        &self,
        config: Config,
        transport: Arc<dyn Transport>,
    ) -> Result<(), MonitorError> {
        config.validate()?;
        let config = Arc::new(config.with_defaults());
        let shipper = Shipper::with_transport(&config, transport);
        self.install(config, Some(shipper)).await;
        Ok(())
    }

    async fn install(&self, config: Arc<Config>, shipper: Option<Shipper>) {
        let _guard = self.lifecycle.lock().await;

        let previous = {
            #[allow(clippy::expect_used)]
            let mut state = self.state.write().expect("lock poisoned");
            state.shipper.take()
        };
        if let Some(previous) = previous {
            debug!("MONITOR | Reconfiguring, stopping previous shipper");
            previous.stop().await;
        }

        let shipper = shipper.map(Arc::new);
        if let Some(shipper) = &shipper {
            shipper.start();
        }

        #[allow(clippy::expect_used)]
        let mut state = self.state.write().expect("lock poisoned");
        state.config = Some(config);
        state.shipper = shipper;
    }

    /// Emits an event at the default level.
    pub fn emit(&self, ctx: &EventContext, name: &str, data: Option<Value>) {
        self.emit_with_level(ctx, name, data, None);
    }

    /// Emits an event. `level` defaults to `info` when absent or empty.
    pub fn emit_with_level(
        &self,
        ctx: &EventContext,
        name: &str,
        data: Option<Value>,
        level: Option<&str>,
    ) {
        let (config, shipper) = {
            #[allow(clippy::expect_used)]
            let state = self.state.read().expect("lock poisoned");
            match &state.config {
                Some(config) => (Arc::clone(config), state.shipper.clone()),
                None => return,
            }
        };

        let event = Event::new(ctx, &config, name, data, level);

        if !config.disable_stdout {
            let line = match event.to_json() {
                Ok(line) => line,
                Err(e) => {
                    error!("MONITOR | Failed to serialize event {name}: {e}");
                    return;
                }
            };
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout
                .write_all(&line)
                .and_then(|()| stdout.write_all(b"\n"))
            {
                debug!("MONITOR | Failed to write event to stdout: {e}");
            }
        }

        if let Some(shipper) = shipper {
            shipper.send(event);
        }
    }

    /// Delivers everything emitted so far. No-op without a shipper.
    pub async fn flush(&self) {
        if let Some(shipper) = self.shipper() {
            shipper.flush().await;
        }
    }

    /// Drains and stops the shipper. Later emits still go to stdout.
    pub async fn shutdown(&self) {
        let _guard = self.lifecycle.lock().await;
        let shipper = {
            #[allow(clippy::expect_used)]
            let mut state = self.state.write().expect("lock poisoned");
            state.shipper.take()
        };
        if let Some(shipper) = shipper {
            shipper.stop().await;
        }
    }

    /// Current configuration, `None` before [`Monitor::init`].
    #[must_use]
    pub fn config(&self) -> Option<Arc<Config>> {
        #[allow(clippy::expect_used)]
        self.state.read().expect("lock poisoned").config.clone()
    }

    fn shipper(&self) -> Option<Arc<Shipper>> {
        #[allow(clippy::expect_used)]
        self.state.read().expect("lock poisoned").shipper.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipper::test_support::RecordingTransport;
    use serde_json::json;

    fn quiet_config() -> Config {
        Config {
            service: "checkout".to_string(),
            env: Some("staging".to_string()),
            job_id: Some("job-1".to_string()),
            disable_stdout: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_emit_before_init_is_noop() {
        let monitor = Monitor::new();
        monitor.emit(&EventContext::new(), "ignored", None);
        monitor.flush().await;
        assert!(monitor.config().is_none());
    }

    #[tokio::test]
    async fn test_init_requires_service() {
        let monitor = Monitor::new();
        let result = monitor.init(Config::default()).await;
        assert!(matches!(result, Err(MonitorError::ServiceRequired)));
        assert!(monitor.config().is_none());
    }

    #[tokio::test]
    async fn test_init_rejects_oversized_batch_size() {
        let monitor = Monitor::new();
        let config = Config {
            ingest_url: Some("http://127.0.0.1:9000/ingest".to_string()),
            batch_size: usize::MAX / 4,
            ..quiet_config()
        };

        let result = monitor.init(config).await;
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
        assert!(monitor.config().is_none());
    }

    #[tokio::test]
    async fn test_init_applies_defaults() {
        let monitor = Monitor::new();
        let config = Config {
            job_id: None,
            batch_size: 0,
            ..quiet_config()
        };
        monitor.init(config).await.expect("init should succeed");

        let config = monitor.config().expect("config should be set");
        assert_eq!(config.job_id.as_deref().map(str::len), Some(36));
        assert_eq!(config.batch_size, 200);
    }

    #[tokio::test]
    async fn test_emit_routes_to_shipper() {
        let transport = Arc::new(RecordingTransport::default());
        let monitor = Monitor::new();
        monitor
            .init_with_transport(quiet_config(), transport.clone())
            .await
            .expect("init should succeed");

        let ctx = EventContext::new()
            .with_request_id("req-1")
            .with_user_id("u-9");
        monitor.emit(&ctx, "order.created", Some(json!({"total": 42})));
        monitor.emit_with_level(&ctx, "order.failed", None, Some("error"));
        monitor.flush().await;

        assert_eq!(
            transport.batch_names(),
            vec![vec!["order.created", "order.failed"]]
        );
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_context_job_id_overrides_configured() {
        let transport = Arc::new(RecordingTransport::default());
        let monitor = Monitor::new();
        monitor
            .init_with_transport(quiet_config(), transport.clone())
            .await
            .expect("init should succeed");

        monitor.emit(&EventContext::new(), "configured", None);
        monitor.emit(&EventContext::new().with_job_id("job-2"), "overridden", None);
        monitor.shutdown().await;

        let events = transport.events();
        assert_eq!(events[0].job_id(), Some("job-1"));
        assert_eq!(events[0].service(), "checkout");
        assert_eq!(events[0].env(), Some("staging"));
        assert_eq!(events[1].job_id(), Some("job-2"));
        assert_eq!(events[1].level(), "info");
    }

    #[tokio::test]
    async fn test_reinit_drains_previous_shipper() {
        let first = Arc::new(RecordingTransport::default());
        let second = Arc::new(RecordingTransport::default());
        let monitor = Monitor::new();

        monitor
            .init_with_transport(quiet_config(), first.clone())
            .await
            .expect("init should succeed");
        monitor.emit(&EventContext::new(), "before", None);

        monitor
            .init_with_transport(quiet_config(), second.clone())
            .await
            .expect("reinit should succeed");
        monitor.emit(&EventContext::new(), "after", None);
        monitor.shutdown().await;

        assert_eq!(first.batch_names(), vec![vec!["before"]]);
        assert_eq!(second.batch_names(), vec![vec!["after"]]);
    }

    #[tokio::test]
    async fn test_emit_after_shutdown_is_not_shipped() {
        let transport = Arc::new(RecordingTransport::default());
        let monitor = Monitor::new();
        monitor
            .init_with_transport(quiet_config(), transport.clone())
            .await
            .expect("init should succeed");

        monitor.shutdown().await;
        monitor.emit(&EventContext::new(), "late", None);
        monitor.flush().await;
        monitor.shutdown().await;

        assert_eq!(transport.attempts(), 0);
        assert!(monitor.config().is_some());
    }

    #[tokio::test]
    async fn test_init_without_ingest_url_has_no_shipper() {
        let monitor = Monitor::new();
        monitor
            .init(quiet_config())
            .await
            .expect("init should succeed");

        monitor.emit(&EventContext::new(), "stdout-only", None);
        assert!(monitor.shipper().is_none());
    }
}
