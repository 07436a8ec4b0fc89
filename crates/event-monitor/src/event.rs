// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The event record and its NDJSON serialization contract.
//!
//! Every record carries `timestamp`, `service`, `name` and `level`. The
//! environment, the four correlation ids and `data` are omitted from the wire
//! record when absent, and decode back to absent rather than to placeholders.

use crate::config::Config;
use crate::context::EventContext;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Level used when the caller does not supply one.
pub const DEFAULT_LEVEL: &str = "info";

/// A single monitoring event. Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    timestamp: String,
    service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    name: String,
    level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl Event {
    /// Builds an event from the call context and a configuration snapshot.
    ///
    /// The job id comes from the context, falling back to the configured
    /// process job id. Request, trace and user ids are never generated here.
    #[must_use]
    pub fn new(
        ctx: &EventContext,
        config: &Config,
        name: &str,
        data: Option<Value>,
        level: Option<&str>,
    ) -> Self {
        let job_id = ctx
            .job_id()
            .or(config.job_id.as_deref())
            .filter(|id| !id.is_empty())
            .map(str::to_owned);

        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            service: config.service.clone(),
            env: config.env.clone().filter(|env| !env.is_empty()),
            job_id,
            request_id: ctx.request_id().map(str::to_owned),
            trace_id: ctx.trace_id().map(str::to_owned),
            user_id: ctx.user_id().map(str::to_owned),
            name: name.to_owned(),
            level: level
                .filter(|level| !level.is_empty())
                .unwrap_or(DEFAULT_LEVEL)
                .to_owned(),
            data: data.filter(|data| !data.is_null()),
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Compact single-line JSON record.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Decodes an NDJSON payload, one event per non-empty line.
pub fn parse_ndjson(payload: &[u8]) -> Result<Vec<Event>, serde_json::Error> {
    payload
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .map(serde_json::from_slice)
        .collect()
}
