// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Request correlation for axum services.
//!
//! [`request_ids`] reads or generates the request and trace ids, stores the
//! resulting [`EventContext`] in the request extensions for handlers to pick
//! up, and echoes both ids back on the response.

use crate::context::EventContext;
use crate::ids::{generate_id, generate_short_id};
use crate::monitor::Monitor;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, Response},
    middleware::Next,
};
use std::sync::Arc;
use tracing::debug;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Builds the context for one inbound request.
///
/// Ids found in the headers are reused as-is; missing ones are generated.
#[must_use]
pub fn context_from_headers(headers: &HeaderMap, default_job_id: Option<&str>) -> EventContext {
    let request_id =
        header_value(headers, REQUEST_ID_HEADER).unwrap_or_else(generate_short_id);
    let trace_id = header_value(headers, TRACE_ID_HEADER).unwrap_or_else(generate_id);

    let ctx = EventContext::new()
        .with_request_id(request_id)
        .with_trace_id(trace_id);
    match default_job_id {
        Some(job_id) => ctx.with_job_id(job_id),
        None => ctx,
    }
}

/// Axum middleware attaching an [`EventContext`] to every request.
///
/// Install with `axum::middleware::from_fn_with_state(monitor, request_ids)`.
pub async fn request_ids(
    State(monitor): State<Arc<Monitor>>,
    mut request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let config = monitor.config();
    let job_id = config.as_ref().and_then(|config| config.job_id.as_deref());
    let ctx = context_from_headers(request.headers(), job_id);

    let echoed = echo_headers(&ctx);
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;
    response.headers_mut().extend(echoed);
    response
}

fn echo_headers(ctx: &EventContext) -> Vec<(HeaderName, HeaderValue)> {
    [
        (REQUEST_ID_HEADER, ctx.request_id()),
        (TRACE_ID_HEADER, ctx.trace_id()),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        let value = value?;
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => Some((name, value)),
            _ => {
                debug!("MONITOR | Not echoing {name}, value is not a valid header");
                None
            }
        }
    })
    .collect()
}
