// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words maxfiles

use super::DiagnosticKind;
use crate::SignalChannelKind;

/// Errors from [`Trigger::new()`] and [`SignalChannel::create()`]. All of them are fatal
/// to construction; once a [`Trigger`] exists it never returns an error.
///
/// | Variant                | Cause                                              |
/// | :--------------------- | :------------------------------------------------- |
/// | [`ResourceExhausted`]  | OS refused the pipe or a socket                    |
/// | [`BindExhausted`]      | every loopback port in the candidate range taken   |
/// | [`LoopbackHandshake`]  | loopback accept / socket mode change failed        |
/// | [`UnsupportedChannel`] | channel kind not available on this platform        |
/// | [`Registration`]       | [`mio::Registry`] refused the read end             |
///
/// [`BindExhausted`]: Self::BindExhausted
/// [`LoopbackHandshake`]: Self::LoopbackHandshake
/// [`Registration`]: Self::Registration
/// [`ResourceExhausted`]: Self::ResourceExhausted
/// [`SignalChannel::create()`]: crate::SignalChannel::create
/// [`Trigger::new()`]: super::Trigger::new
/// [`Trigger`]: super::Trigger
/// [`UnsupportedChannel`]: Self::UnsupportedChannel
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TriggerError {
    #[error("OS refused to allocate the {kind} signal channel")]
    #[diagnostic(code(r3bl_select_trigger::resource_exhausted))]
    #[cfg_attr(
        target_os = "linux",
        diagnostic(help(
            "Check OS resource limits - \
             use `ulimit -n` for file descriptors, \
             `cat /proc/sys/fs/file-max` for system-wide limit"
        ))
    )]
    #[cfg_attr(
        target_os = "macos",
        diagnostic(help(
            "Check OS resource limits - \
             use `ulimit -n` for file descriptors, \
             `launchctl limit maxfiles` for system-wide limit"
        ))
    )]
    ResourceExhausted {
        kind: SignalChannelKind,
        #[source]
        source: std::io::Error,
    },

    #[error("No free loopback port for the trigger in {first_port} (+{port_count} ports)")]
    #[diagnostic(
        code(r3bl_select_trigger::bind_exhausted),
        help("Another process holds every port in the range; configure a different range")
    )]
    BindExhausted {
        first_port: u16,
        port_count: u16,
        /// Error from the last bind attempt, [`None`] if the range was empty.
        #[source]
        last_error: Option<std::io::Error>,
    },

    #[error("Loopback signal channel handshake failed")]
    #[diagnostic(code(r3bl_select_trigger::loopback_handshake))]
    LoopbackHandshake(#[source] std::io::Error),

    #[error("The {kind} signal channel is not available on this platform")]
    #[diagnostic(
        code(r3bl_select_trigger::unsupported_channel),
        help("Use SignalChannelKind::platform_default()")
    )]
    UnsupportedChannel { kind: SignalChannelKind },

    #[error("Failed to register the trigger with the event loop")]
    #[diagnostic(code(r3bl_select_trigger::registration))]
    Registration(#[source] std::io::Error),
}

/// A thunk did not complete normally. Handed to the [`DiagnosticSink`] as
/// `(kind(), to_string())`.
///
/// [`DiagnosticSink`]: super::DiagnosticSink
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ThunkExecutionError {
    #[error("thunk #{position} in batch returned an error: {report}")]
    #[diagnostic(code(r3bl_select_trigger::thunk::failed))]
    Failed {
        /// Index of the thunk within its drained batch.
        position: usize,
        report: miette::Report,
    },

    #[error("thunk #{position} in batch panicked: {payload}")]
    #[diagnostic(
        code(r3bl_select_trigger::thunk::panicked),
        help("Thunks run on the event loop thread; keep them short and infallible")
    )]
    Panicked { position: usize, payload: String },
}

impl ThunkExecutionError {
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Failed { .. } => DiagnosticKind::ThunkFailed,
            Self::Panicked { .. } => DiagnosticKind::ThunkPanicked,
        }
    }
}
