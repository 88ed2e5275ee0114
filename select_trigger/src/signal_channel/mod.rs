// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll kqueue wakeup wakeups cloexec

//! The OS-level signal channel behind a [`Trigger`].
//!
//! A signal channel is a dedicated, always-open handle whose only purpose is to become
//! readable on demand (the "self-pipe trick"). It has two ends:
//!
//! | End              | Owner                       | Used for                          |
//! | :--------------- | :-------------------------- | :-------------------------------- |
//! | [`SignalReader`] | the loop thread (`Trigger`) | registered with [`mio::Registry`] |
//! | [`SignalWriter`] | every producer (shared)     | one wakeup byte per pull          |
//!
//! Exactly one end is registered with the loop, and only for readable interest. The
//! writer is never read and never registered.
//!
//! # Variants
//!
//! The variant is picked by platform capability ([`SignalChannelKind::platform_default()`]):
//!
//! - [`PipeSignalChannel`] (unix): a unidirectional OS pipe from [`mio::unix::pipe`].
//! - [`LoopbackSignalChannel`] (everywhere): a TCP socket pair over `127.0.0.1`, for
//!   platforms where the readiness wait only accepts sockets. Available on unix too, so
//!   it can be exercised there.
//!
//! Both produce the same [`SignalChannel`] shape, so nothing above this module cares
//! which one it got. Closing a channel is dropping its ends.
//!
//! [`Trigger`]: crate::Trigger

// Attach sources.
pub mod drain_read_error;
pub mod loopback_channel;
#[cfg(unix)]
pub mod pipe_channel;
pub mod signal_channel_kind;
pub mod signal_ends;

// Re-export.
pub use drain_read_error::*;
pub use loopback_channel::*;
#[cfg(unix)]
pub use pipe_channel::*;
pub use signal_channel_kind::*;
pub use signal_ends::*;

use crate::TriggerError;

/// A connected pair of signal channel ends, created together.
///
/// Use [`into_split()`] to hand the [`SignalReader`] to the loop and share the
/// [`SignalWriter`] with producers. Dropping both ends releases the OS handles, once.
///
/// [`into_split()`]: Self::into_split
#[derive(Debug)]
pub struct SignalChannel {
    pub reader: SignalReader,
    pub writer: SignalWriter,
}

impl SignalChannel {
    /// Creates a channel of the requested `kind`.
    ///
    /// `loopback_ports` is only consulted for [`SignalChannelKind::Loopback`].
    ///
    /// # Errors
    ///
    /// - [`TriggerError::ResourceExhausted`] if the OS refuses the pipe or a socket.
    /// - [`TriggerError::BindExhausted`] if no loopback port in range is free.
    /// - [`TriggerError::LoopbackHandshake`] if the loopback connect/accept fails.
    /// - [`TriggerError::UnsupportedChannel`] if `kind` is not available here.
    pub fn create(
        kind: SignalChannelKind,
        loopback_ports: LoopbackPortRange,
    ) -> Result<Self, TriggerError> {
        match kind {
            #[cfg(unix)]
            SignalChannelKind::Pipe => PipeSignalChannel::create(),
            #[cfg(not(unix))]
            SignalChannelKind::Pipe => Err(TriggerError::UnsupportedChannel { kind }),
            SignalChannelKind::Loopback => LoopbackSignalChannel::create(loopback_ports),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SignalChannelKind { self.reader.kind() }

    #[must_use]
    pub fn into_split(self) -> (SignalReader, SignalWriter) { (self.reader, self.writer) }
}
