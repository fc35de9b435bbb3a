/*!
 * Structured Tracing
 * Subscriber setup plus spans for syscalls and multi-step operations
 *
 * Features:
 * - Trace ID per span for correlating events
 * - JSON or compact human-readable output
 * - Slow-path warnings emitted when a span closes
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

const SLOW_SYSCALL_MS: u64 = 10;
const SLOW_OPERATION_MS: u64 = 100;

/// Initialize the global subscriber
///
/// Environment variables:
/// - RUST_LOG: log filter (default: info)
/// - KERNEL_TRACE_JSON: `1` or `true` for JSON output
///
/// A second call is a no-op.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Unique trace ID for correlating events
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span around one syscall
pub struct SyscallSpan {
    span: tracing::Span,
    start: Instant,
    syscall_name: &'static str,
    trace_id: String,
}

impl SyscallSpan {
    pub fn new(syscall_name: &'static str, pid: u32) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "syscall",
            trace_id = %trace_id,
            syscall = syscall_name,
            pid = pid,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
            return_value = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            syscall_name,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Successful return value
    pub fn record_return(&self, value: i64) {
        self.span.record("result", "success");
        self.span.record("return_value", value);
    }

    pub fn record_errno(&self, errno: i32) {
        self.span.record("result", "error");
        self.span.record("errno", errno);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() as u64 > SLOW_SYSCALL_MS {
            warn!(
                trace_id = %self.trace_id,
                syscall = self.syscall_name,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow syscall detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                syscall = self.syscall_name,
                duration_us = duration.as_micros() as u64,
                "syscall completed"
            );
        }
    }
}

/// Span around a multi-step operation (tree walks, lifecycle hooks)
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = %trace_id,
            operation = operation,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            items_processed = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
        self.span.record("result", "error");
    }

    pub fn record_items_processed(&self, count: usize) {
        self.span.record("items_processed", count as u64);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() as u64 > SLOW_OPERATION_MS {
            warn!(
                trace_id = %self.trace_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

#[inline]
pub fn span_syscall(name: &'static str, pid: u32) -> SyscallSpan {
    SyscallSpan::new(name, pid)
}

#[inline]
pub fn span_operation(name: &'static str) -> OperationSpan {
    OperationSpan::new(name)
}
