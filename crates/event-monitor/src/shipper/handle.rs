// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::error::MonitorError;
use crate::event::Event;
use crate::shipper::constants::{
    DEFAULT_FLUSH_INTERVAL, MAX_BATCH_SIZE, QUEUE_CAPACITY_MULTIPLIER,
};
use crate::shipper::flusher::{Flusher, Transport};
use crate::shipper::queue::{intake, IntakeSender};
use crate::shipper::service::{ShipperCommand, ShipperService};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Lifecycle handle around one flush engine.
///
/// Constructed stopped; [`Shipper::start`] spawns the engine on the current
/// tokio runtime and [`Shipper::stop`] drains it. `send` is safe from any
/// thread at any point of the lifecycle.
pub struct Shipper {
    intake: IntakeSender,
    commands: mpsc::UnboundedSender<ShipperCommand>,
    cancel_token: CancellationToken,
    service: Mutex<Option<ShipperService>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Shipper {
    /// Builds an HTTP shipper for `config.ingest_url`.
    pub fn new(config: Arc<Config>) -> Result<Self, MonitorError> {
        let endpoint = config.ingest_url.clone().ok_or_else(|| {
            MonitorError::InvalidConfig("ingest_url is required to ship events".to_string())
        })?;
        let flusher = Flusher::new(endpoint, Arc::clone(&config))?;
        Ok(Self::with_transport(&config, Arc::new(flusher)))
    }

    /// Builds a shipper delivering through a custom transport.
    #[must_use]
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let batch_size = config.batch_size.clamp(1, MAX_BATCH_SIZE);
        let flush_interval = if config.flush_interval.is_zero() {
            DEFAULT_FLUSH_INTERVAL
        } else {
            config.flush_interval
        };
        let queue_capacity = batch_size.saturating_mul(QUEUE_CAPACITY_MULTIPLIER);

        let (intake, intake_rx) = intake(queue_capacity);
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let service = ShipperService::new(
            intake_rx,
            commands_rx,
            batch_size,
            queue_capacity,
            flush_interval,
            transport,
            cancel_token.clone(),
        );

        Self {
            intake,
            commands,
            cancel_token,
            service: Mutex::new(Some(service)),
            task: Mutex::new(None),
        }
    }

    /// Spawns the flush loop. Must be called from within a tokio runtime.
    pub fn start(&self) {
        #[allow(clippy::expect_used)]
        let service = self.service.lock().expect("lock poisoned").take();
        let Some(service) = service else {
            warn!("MONITOR | Shipper already started or stopped, ignoring start");
            return;
        };

        let task = tokio::spawn(service.run());
        #[allow(clippy::expect_used)]
        self.task.lock().expect("lock poisoned").replace(task);
    }

    /// Queues an event without blocking. Dropped when the queue is full.
    pub fn send(&self, event: Event) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        self.intake.enqueue(event);
    }

    /// Flushes everything queued so far and waits for the delivery attempt.
    ///
    /// Returns immediately when the engine has not been started, and as soon
    /// as the engine has exited when it is stopping.
    pub async fn flush(&self) {
        if self.cancel_token.is_cancelled() || !self.is_started() {
            debug!("MONITOR | Shipper not running, skipping flush");
            return;
        }

        let (ack, done) = oneshot::channel();
        if self.commands.send(ShipperCommand::Flush(ack)).is_err() {
            return;
        }
        // Err means the engine exited and dropped the request
        let _ = done.await;
    }

    /// Drains queued events, performs a final flush, and waits for the engine to exit.
    ///
    /// A shipper that was never started drains inline. Calling `stop` again is a no-op.
    pub async fn stop(&self) {
        self.cancel_token.cancel();

        #[allow(clippy::expect_used)]
        let unstarted = self.service.lock().expect("lock poisoned").take();
        if let Some(service) = unstarted {
            service.run().await;
            return;
        }

        #[allow(clippy::expect_used)]
        let task = self.task.lock().expect("lock poisoned").take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("MONITOR | Shipper task failed: {e}");
            }
        }
    }

    fn is_started(&self) -> bool {
        #[allow(clippy::expect_used)]
        self.task.lock().expect("lock poisoned").is_some()
    }
}

impl Drop for Shipper {
    fn drop(&mut self) {
        // Lets a detached engine drain and exit instead of idling forever
        self.cancel_token.cancel();
    }
}

impl std::fmt::Debug for Shipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shipper")
            .field("stopped", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}
