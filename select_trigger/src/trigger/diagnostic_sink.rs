// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::Display;

/// What went wrong inside a thunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticKind {
    /// The thunk returned [`Err`].
    #[strum(serialize = "thunk_failed")]
    ThunkFailed,
    /// The thunk panicked.
    #[strum(serialize = "thunk_panicked")]
    ThunkPanicked,
}

/// Where [`Trigger::handle_readable()`] reports thunks that failed. A failure is never
/// dropped silently and never fatal to the loop.
///
/// Any `Fn(DiagnosticKind, String) + Send + 'static` closure is a sink, which is handy
/// for tests and for forwarding into an application's own error reporting.
///
/// # Trait Bounds - [`Send`] + `'static`
///
/// The sink lives inside the [`Trigger`], which is commonly built on one thread and
/// then moved onto the loop thread. It is only ever called from the loop thread, so no
/// [`Sync`] is needed.
///
/// [`Trigger`]: super::Trigger
/// [`Trigger::handle_readable()`]: super::Trigger::handle_readable
pub trait DiagnosticSink: Send + 'static {
    fn report(&self, kind: DiagnosticKind, message: String);
}

impl<F> DiagnosticSink for F
where
    F: Fn(DiagnosticKind, String) + Send + 'static,
{
    fn report(&self, kind: DiagnosticKind, message: String) { self(kind, message); }
}

/// Default sink: every failure becomes a [`tracing::error!`] event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn report(&self, kind: DiagnosticKind, message: String) {
        tracing::error!(
            message = "exception in trigger thunk",
            kind = %kind,
            details = %message
        );
    }
}
