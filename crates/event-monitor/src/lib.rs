// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Event Monitor
//!
//! Structured event emitter for services. Every event carries the service
//! name, environment and whichever correlation ids (job, request, trace,
//! user) are known at the call site.
//!
//! Events are printed to stdout as NDJSON and, when an ingest URL is
//! configured, shipped asynchronously in batches:
//!
//! - [`Monitor`]: initialization, emit, flush and shutdown
//! - [`shipper`]: bounded intake queue, flush engine and HTTP delivery
//! - [`middleware`]: axum middleware propagating request and trace ids
//! - [`logger`]: formatter for the crate's own diagnostics
//!
//! Emitting never blocks and never fails: a full queue sheds the event and a
//! failed delivery drops the batch, both reported only through `tracing`.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod ids;
pub mod logger;
pub mod middleware;
pub mod monitor;
pub mod shipper;

pub use config::{Compression, Config};
pub use context::EventContext;
pub use error::{DeliveryError, MonitorError};
pub use event::Event;
pub use monitor::Monitor;
pub use shipper::{Flusher, Shipper, Transport};
