use std::{backtrace::Backtrace, fmt};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
};

/// Event format that appends a captured stack trace to every error record.
pub(crate) struct StacktraceOnError<F> {
    inner: F,
}

impl<F> StacktraceOnError<F> {
    pub(crate) fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<S, N, F> FormatEvent<S, N> for StacktraceOnError<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.inner.format_event(ctx, writer.by_ref(), event)?;
        if *event.metadata().level() == Level::ERROR {
            writeln!(writer, "stacktrace:\n{}", Backtrace::force_capture())?;
        }
        Ok(())
    }
}
