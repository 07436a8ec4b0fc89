// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One-line text format for the monitor's own `tracing` diagnostics.
//!
//! A line is the `EVENT_MONITOR` tag, the level, the chain of entered spans
//! (outermost first, each with its recorded fields) and finally the message
//! with its fields:
//!
//! ```text
//! EVENT_MONITOR | WARN | flush{batch=3}: Delivery failed attempt=1
//! ```
//!
//! Diagnostics belong on stderr; stdout carries the NDJSON event stream.
//! Install it on a fmt subscriber with `.event_format(Formatter)`.

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::{LookupSpan, SpanRef};

pub const LOG_PREFIX: &str = "EVENT_MONITOR";

/// `FormatEvent` implementation producing the tagged line above.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

fn write_span<S, N>(writer: &mut format::Writer<'_>, span: &SpanRef<'_, S>) -> fmt::Result
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let extensions = span.extensions();
    match extensions
        .get::<FormattedFields<N>>()
        .filter(|fields| !fields.is_empty())
    {
        Some(fields) => write!(writer, "{}{{{fields}}}: ", span.name()),
        None => write!(writer, "{}: ", span.name()),
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{LOG_PREFIX} | {} | ", event.metadata().level())?;

        for span in ctx.event_scope().into_iter().flat_map(|scope| scope.from_root()) {
            write_span::<S, N>(&mut writer, &span)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
