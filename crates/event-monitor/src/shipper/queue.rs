// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::event::Event;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Creates the bounded intake queue between emitters and the flush engine.
pub(crate) fn intake(capacity: usize) -> (IntakeSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (IntakeSender { tx }, rx)
}

/// Producer side of the intake queue. Cheap to clone, never blocks.
#[derive(Clone, Debug)]
pub(crate) struct IntakeSender {
    tx: mpsc::Sender<Event>,
}

impl IntakeSender {
    /// Returns whether the event was accepted. A full queue sheds the event.
    pub(crate) fn enqueue(&self, event: Event) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    "MONITOR | Shipper buffer full, dropping event {}",
                    event.name()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("MONITOR | Shipper stopped, ignoring event");
                false
            }
        }
    }
}
