// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of one batch to the ingest endpoint.
//!
//! ```text
//!   Batch (Vec<Event>)
//!          │
//!          v
//!   ┌─────────────┐
//!   │   NDJSON    │ (one record + '\n' per event)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │  Compress   │ (optional: gzip or zstd)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │  HTTP POST  │ (single attempt, bounded by timeout)
//!   └─────────────┘
//! ```
//!
//! There is no retry: a transport error or a non-success status discards the
//! batch. The flush engine logs the outcome and moves on.

use crate::config::{Compression, Config};
use crate::error::{DeliveryError, MonitorError};
use crate::event::Event;
use crate::shipper::constants::NDJSON_CONTENT_TYPE;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Seam between the flush engine and the outside world.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempts delivery of one batch exactly once.
    ///
    /// Returns the number of events written to the payload.
    async fn deliver(&self, batch: Vec<Event>) -> Result<usize, DeliveryError>;
}

/// HTTP transport posting NDJSON batches to the configured ingest URL.
#[derive(Debug, Clone)]
pub struct Flusher {
    client: reqwest::Client,
    endpoint: String,
    config: Arc<Config>,
    headers: HeaderMap,
}

impl Flusher {
    pub fn new(endpoint: String, config: Arc<Config>) -> Result<Self, MonitorError> {
        let headers = build_headers(&config)?;
        let client = get_client(config.delivery_timeout);
        Ok(Flusher {
            client,
            endpoint,
            config,
            headers,
        })
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        match self.config.compression {
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Compression::Zstd(level) => {
                let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), level)?;
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }
}

#[async_trait]
impl Transport for Flusher {
    async fn deliver(&self, batch: Vec<Event>) -> Result<usize, DeliveryError> {
        let (payload, encoded) = encode_batch(&batch);
        if encoded == 0 {
            return Ok(0);
        }

        let body = if self.config.compression_enabled {
            self.compress(&payload)?
        } else {
            payload
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.config.delivery_timeout)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        // Drain the body so the connection goes back to the pool
        if let Err(e) = resp.bytes().await {
            debug!("MONITOR | Failed to read ingest response body: {e}");
        }

        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }
        Ok(encoded)
    }
}

/// Serializes a batch to NDJSON, skipping events that fail to encode.
///
/// Returns the payload and the number of records it holds.
pub(crate) fn encode_batch(batch: &[Event]) -> (Vec<u8>, usize) {
    let mut payload = Vec::new();
    let mut encoded = 0;
    for event in batch {
        match serde_json::to_writer(&mut payload, event) {
            Ok(()) => {
                payload.push(b'\n');
                encoded += 1;
            }
            Err(e) => {
                error!(
                    "MONITOR | Failed to marshal event {}, skipping: {e}",
                    event.name()
                );
                // to_writer may have written a partial record
                truncate_to_last_record(&mut payload);
            }
        }
    }
    (payload, encoded)
}

fn truncate_to_last_record(payload: &mut Vec<u8>) {
    let keep = payload
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |index| index + 1);
    payload.truncate(keep);
}

fn build_headers(config: &Config) -> Result<HeaderMap, MonitorError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(NDJSON_CONTENT_TYPE));

    if config.compression_enabled {
        headers.insert(
            CONTENT_ENCODING,
            HeaderValue::from_static(config.compression.content_encoding()),
        );
    }

    if let Some(api_key) = config.api_key.as_deref().filter(|key| !key.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            MonitorError::InvalidConfig(format!("API key is not a valid header value: {e}"))
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn get_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("MONITOR | Failed to build HTTP client: {e}, using reqwest defaults");
            reqwest::Client::new()
        }
    }
}
