// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Defaults for batching, timing and wire encoding of shipped events.

use std::time::Duration;

/// Number of events that triggers an immediate flush.
///
/// The intake queue holds [`QUEUE_CAPACITY_MULTIPLIER`] times this many
/// events before new ones are dropped.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Largest accepted batch size. Bounds the intake queue allocation.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Intake queue capacity as a multiple of the batch size.
///
/// Absorbs a burst of two full batches while the flush engine is busy
/// delivering, without letting the queue grow unbounded.
pub const QUEUE_CAPACITY_MULTIPLIER: usize = 2;

/// Period of the time-triggered flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single delivery attempt.
///
/// Exceeding it is a transport failure like any other: the batch is dropped.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_ZSTD_COMPRESSION_LEVEL: i32 = 3;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
