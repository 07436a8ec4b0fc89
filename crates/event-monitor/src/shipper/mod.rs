// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Asynchronous batching and delivery of events to the ingest endpoint.
//!
//! Emitters hand events to a [`Shipper`] without blocking. A single engine
//! task groups them into batches and delivers each batch through a
//! [`Transport`], by default the HTTP [`Flusher`].

pub mod constants;
pub mod flusher;
mod handle;
pub(crate) mod queue;
pub(crate) mod service;

pub use flusher::{Flusher, Transport};
pub use handle::Shipper;
