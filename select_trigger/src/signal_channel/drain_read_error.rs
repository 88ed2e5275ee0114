// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::SignalChannelKind;

/// Reading wakeup bytes out of a [`SignalReader`] failed with something other than
/// "would block" or "interrupted".
///
/// Never propagated past [`Trigger::handle_readable()`], which logs it and carries on as
/// if there was nothing to read. A concurrent close racing a pending wakeup is the usual
/// cause.
///
/// [`SignalReader`]: super::SignalReader
/// [`Trigger::handle_readable()`]: crate::Trigger::handle_readable
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("Failed to drain wakeup bytes from the {kind} signal channel")]
#[diagnostic(
    code(r3bl_select_trigger::signal_channel::drain_read),
    help("The channel was most likely torn down while a wakeup was pending")
)]
pub struct DrainReadError {
    pub kind: SignalChannelKind,
    /// Bytes successfully drained before the error.
    pub bytes_drained: usize,
    #[source]
    pub source: std::io::Error,
}
