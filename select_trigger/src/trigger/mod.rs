// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll kqueue wakeup wakeups coalesce

//! The [`Trigger`]: wake a blocked [`mio::Poll`] loop from any thread, and optionally
//! run a thunk on the loop thread once it wakes.
//!
//! # Wake / drain protocol
//!
//! ```text
//! producer thread                          loop thread
//! ───────────────                          ───────────
//! pull_with(thunk)                         poll.poll(..)  ◄─── blocked
//!   lock; queue.push(thunk); unlock              │
//!   write 1 byte ──────────────────────────────► │ readable
//!                                          handle_readable()
//!                                            read until WouldBlock
//!                                            lock; swap queue; unlock
//!                                            run thunk₀, thunk₁, ...
//! ```
//!
//! - **Ordering**: the thunk is queued strictly before its byte is written, so a drain
//!   that consumes the byte also sees the thunk. Thunks run in append order, one after
//!   another, always on the loop thread.
//! - **Coalescing**: the byte is a kick, not a count. Several pulls before a drain may
//!   produce a single wakeup; that is fine because a drain always takes the whole queue.
//! - **Locking**: the queue mutex is held for a push or a swap only, never across a
//!   thunk or a read/write syscall.
//! - **Failures**: a thunk returning [`Err`] or panicking is reported to the
//!   [`DiagnosticSink`] and does not affect the thunks after it, or the loop.
//!
//! # Ownership
//!
//! One [`Trigger`] per loop, owned by the loop (no global singleton). Producers get a
//! [`TriggerHandle`], which is cheap to clone and [`Send`] + [`Sync`]. Thunks are
//! zero-argument; since they run on the loop thread, they can reach loop-owned state
//! kept in a [`thread_local!`] without any locking.
//!
//! # Driving it from a loop
//!
//! ```no_run
//! use mio::{Events, Poll, Token};
//! use r3bl_select_trigger::{Continuation, Trigger};
//!
//! # fn main() -> miette::Result<()> {
//! const TRIGGER: Token = Token(0);
//!
//! let mut poll = Poll::new().map_err(|e| miette::miette!("{e}"))?;
//! let mut trigger = Trigger::new(poll.registry(), TRIGGER)?;
//!
//! let handle = trigger.handle();
//! std::thread::spawn(move || {
//!     handle.pull_with(|| {
//!         println!("running on the loop thread");
//!         Ok(())
//!     });
//! });
//!
//! let mut events = Events::with_capacity(64);
//! 'event_loop: loop {
//!     poll.poll(&mut events, None).map_err(|e| miette::miette!("{e}"))?;
//!     for event in &events {
//!         if trigger.handle_event(event) == Some(Continuation::Stop) {
//!             break 'event_loop;
//!         }
//!         // ... dispatch the loop's other sources ...
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// Attach sources.
pub mod diagnostic_sink;
pub mod thunk_queue;
pub mod trigger_config;
pub mod trigger_errors;
pub mod trigger_impl;

// Re-export.
pub use diagnostic_sink::*;
pub use thunk_queue::*;
pub use trigger_config::*;
pub use trigger_errors::*;
pub use trigger_impl::*;

/// Enables per-pull and per-drain [`tracing::debug!`] output. Far too chatty to leave
/// on outside of debugging a wakeup problem.
pub const DEBUG_TRIGGER_SHOW_WAKEUPS: bool = false;

#[cfg(test)]
mod tests;
