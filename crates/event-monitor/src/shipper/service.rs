// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The flush engine: the single consumer owning the batch buffer.
//!
//! ```text
//!    ┌──────────────┐
//!    │   Emitters   │ (any task or thread)
//!    └──────┬───────┘
//!           │ try_send (bounded, drop on full)
//!           v
//!    ┌──────────────┐     Flush(ack)     ┌──────────────┐
//!    │ Intake queue │ <───────────────── │   Shipper    │
//!    └──────┬───────┘   cancel (stop)    │    handle    │
//!           │                            └──────────────┘
//!           v
//!    ┌──────────────┐
//!    │ShipperService│ (buffer owned here, no locks)
//!    └──────┬───────┘
//!           │ size reached / tick / flush / stop
//!           v
//!    ┌──────────────┐
//!    │  Transport   │
//!    └──────────────┘
//! ```
//!
//! The engine is `running` until the cancellation token fires, then
//! `draining` (moves what is already queued into batches of at most
//! `batch_size` and delivers them), then `stopped` when [`ShipperService::run`]
//! returns. Delivery failures are logged and never stop the loop.

use crate::event::Event;
use crate::shipper::flusher::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Requests sent from the handle to the running engine.
#[derive(Debug)]
pub(crate) enum ShipperCommand {
    /// Flush everything queued so far and acknowledge once delivery was attempted.
    Flush(oneshot::Sender<()>),
}

pub(crate) struct ShipperService {
    intake: mpsc::Receiver<Event>,
    commands: mpsc::UnboundedReceiver<ShipperCommand>,
    buffer: Vec<Event>,
    batch_size: usize,
    queue_capacity: usize,
    flush_interval: Duration,
    transport: Arc<dyn Transport>,
    cancel_token: CancellationToken,
}

impl ShipperService {
    pub(crate) fn new(
        intake: mpsc::Receiver<Event>,
        commands: mpsc::UnboundedReceiver<ShipperCommand>,
        batch_size: usize,
        queue_capacity: usize,
        flush_interval: Duration,
        transport: Arc<dyn Transport>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            intake,
            commands,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            queue_capacity,
            flush_interval,
            transport,
            cancel_token,
        }
    }

    /// Runs until the cancellation token fires or every handle is dropped.
    pub(crate) async fn run(mut self) {
        debug!("MONITOR | Shipper service started");

        // First tick one full period from now rather than immediately
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    debug!("MONITOR | Shipper received stop signal, draining");
                    break;
                }
                Some(command) = self.commands.recv() => match command {
                    ShipperCommand::Flush(ack) => {
                        self.collect_queued(self.queue_capacity).await;
                        self.flush().await;
                        if ack.send(()).is_err() {
                            debug!("MONITOR | Flush requester went away before acknowledgement");
                        }
                    }
                },
                _ = ticker.tick() => {
                    self.flush().await;
                }
                event = self.intake.recv() => match event {
                    Some(event) => self.push(event).await,
                    None => {
                        debug!("MONITOR | Intake closed, draining");
                        break;
                    }
                },
            }
        }

        // Refuse new input, then take only what is already queued
        self.intake.close();
        self.collect_queued(usize::MAX).await;
        self.flush().await;

        debug!("MONITOR | Shipper service stopped");
    }

    /// Moves up to `limit` already-queued events into the buffer without waiting.
    async fn collect_queued(&mut self, limit: usize) {
        let mut moved = 0;
        while moved < limit {
            match self.intake.try_recv() {
                Ok(event) => {
                    self.push(event).await;
                    moved += 1;
                }
                Err(_) => break,
            }
        }
    }

    async fn push(&mut self, event: Event) {
        self.buffer.push(event);
        if self.buffer.len() >= self.batch_size {
            self.flush().await;
        }
    }

    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        let n_events = batch.len();
        debug!("MONITOR | Flushing {n_events} events");

        match self.transport.deliver(batch).await {
            Ok(shipped) => debug!("MONITOR | Shipped {shipped} of {n_events} events"),
            Err(e) => error!("MONITOR | Failed to ship {n_events} events, dropping batch: {e}"),
        }
    }
}
