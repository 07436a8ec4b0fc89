// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors surfaced synchronously to the caller of initialization.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Config.service is required")]
    ServiceRequired,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Terminal outcome of one delivery attempt. Never propagated to emitters.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to compress payload: {0}")]
    Compression(#[from] std::io::Error),

    #[error("failed to ship events: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ingest returned status {}", .0.as_u16())]
    Status(StatusCode),
}
