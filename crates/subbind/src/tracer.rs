//! Subscript binding tracing infrastructure.
//!
//! Provides a trait-based tracing system for the aggregate → bind → dispatch pipeline.
//! When using [`NoopTracer`], all trace methods compile away entirely via monomorphization,
//! the same way [`NoLimitTracker`](crate::resource::NoLimitTracker) removes limit checks.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable binding log to stderr |
//! | [`RecordingTracer`] | Full event recording for assertions or post-mortem |
//!
//! # Usage
//!
//! ```
//! use subbind::{Dispatcher, NoLimitTracker, RecordingTracer};
//!
//! let dispatcher = Dispatcher::new(NoLimitTracker, RecordingTracer::new());
//! assert!(dispatcher.tracer().events().is_empty());
//! ```

use crate::{exception::BindingError, subscript::SubscriptOp};

/// Trace event emitted while binding and dispatching a subscript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Positional components were collapsed into the aggregated index.
    Aggregate {
        /// Number of positional components written in the subscript.
        components: usize,
    },
    /// Binding started against a handler signature.
    BindStart {
        op: SubscriptOp,
        /// Number of declared parameters, including index and value.
        params: usize,
        /// Number of keyword arguments supplied.
        keywords: usize,
    },
    /// An extra parameter was satisfied by a keyword.
    KeywordBound { name: String },
    /// An extra parameter fell back to its declared default.
    DefaultApplied { name: String },
    /// Binding failed.
    BindError { error: BindingError },
    /// The handler is about to be invoked.
    Dispatch {
        op: SubscriptOp,
        /// Number of bound arguments passed to the handler.
        args: usize,
    },
}

/// Trait for subscript binding tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait BindTracer: std::fmt::Debug {
    /// Called after the positional components have been aggregated.
    #[inline(always)]
    fn on_aggregate(&mut self, _components: usize) {}

    /// Called before any parameter is filled.
    #[inline(always)]
    fn on_bind_start(&mut self, _op: SubscriptOp, _params: usize, _keywords: usize) {}

    /// Called when an extra parameter consumes a keyword.
    #[inline(always)]
    fn on_keyword_bound(&mut self, _name: &str) {}

    /// Called when an extra parameter takes its default value.
    #[inline(always)]
    fn on_default_applied(&mut self, _name: &str) {}

    /// Called when binding fails, right before the error is returned.
    #[inline(always)]
    fn on_bind_error(&mut self, _error: &BindingError) {}

    /// Called right before the handler is invoked with the bound arguments.
    #[inline(always)]
    fn on_dispatch(&mut self, _op: SubscriptOp, _args: usize) {}
}

// ============================================================================
// NoopTracer: zero-cost production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl BindTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable binding log
// ============================================================================

/// Tracer that prints a human-readable binding log to stderr.
///
/// Output format:
/// ```text
/// [aggregate] components=2
/// [bind] __getitem__ params=3 keywords=2
///   kw1 <- keyword
///   kw2 <- default
/// [dispatch] __getitem__ args=3
/// ```
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of lines to print before going quiet. None = unlimited.
    limit: Option<usize>,
    count: usize,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self { limit: None, count: 0 }
    }

    /// Creates a stderr tracer that stops printing after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
        }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.limit.is_some_and(|limit| self.count >= limit) {
            return;
        }
        self.count += 1;
        eprintln!("{args}");
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl BindTracer for StderrTracer {
    fn on_aggregate(&mut self, components: usize) {
        self.line(format_args!("[aggregate] components={components}"));
    }

    fn on_bind_start(&mut self, op: SubscriptOp, params: usize, keywords: usize) {
        self.line(format_args!("[bind] {op} params={params} keywords={keywords}"));
    }

    fn on_keyword_bound(&mut self, name: &str) {
        self.line(format_args!("  {name} <- keyword"));
    }

    fn on_default_applied(&mut self, name: &str) {
        self.line(format_args!("  {name} <- default"));
    }

    fn on_bind_error(&mut self, error: &BindingError) {
        self.line(format_args!("[bind error] {error}"));
    }

    fn on_dispatch(&mut self, op: SubscriptOp, args: usize) {
        self.line(format_args!("[dispatch] {op} args={args}"));
    }
}

// ============================================================================
// RecordingTracer: full event capture
// ============================================================================

/// Tracer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Takes the recorded events, leaving the tracer empty.
    pub fn take_events(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl BindTracer for RecordingTracer {
    fn on_aggregate(&mut self, components: usize) {
        self.events.push(TraceEvent::Aggregate { components });
    }

    fn on_bind_start(&mut self, op: SubscriptOp, params: usize, keywords: usize) {
        self.events.push(TraceEvent::BindStart { op, params, keywords });
    }

    fn on_keyword_bound(&mut self, name: &str) {
        self.events.push(TraceEvent::KeywordBound { name: name.to_owned() });
    }

    fn on_default_applied(&mut self, name: &str) {
        self.events.push(TraceEvent::DefaultApplied { name: name.to_owned() });
    }

    fn on_bind_error(&mut self, error: &BindingError) {
        self.events.push(TraceEvent::BindError { error: error.clone() });
    }

    fn on_dispatch(&mut self, op: SubscriptOp, args: usize) {
        self.events.push(TraceEvent::Dispatch { op, args });
    }
}
