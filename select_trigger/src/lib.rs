// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll kqueue wakeup wakeups

//! A cross-thread wakeup primitive for a single-threaded, readiness-based event loop
//! built on [`mio::Poll`].
//!
//! The loop thread normally sits blocked inside [`Poll::poll()`], and it only learns
//! about the sources it registered up front. Worker threads that produce results (data
//! to send, state to mutate) have no source of their own to signal the loop with. A
//! [`Trigger`] owns a dedicated, always-registered signal channel. Any thread can
//! [`pull()`] it, which immediately unblocks [`Poll::poll()`], and can optionally hand a
//! thunk to the loop thread to run once it wakes. Since all thunks run on the loop
//! thread, the loop's own data structures never need locks.
//!
//! ```text
//! ┌──────────────┐  pull_with(thunk)   ┌─────────────────────┐
//! │ worker A     │ ───────┬──────────► │ ThunkQueue (Mutex)  │
//! └──────────────┘        │            └─────────────────────┘
//! ┌──────────────┐        │  1 byte    ┌─────────────────────┐
//! │ worker B     │ ───────┴──────────► │ signal channel      │
//! └──────────────┘                     │ (pipe or loopback)  │
//!                                      └──────────┬──────────┘
//!                                                 │ readable
//!                                                 ▼
//!                                      ┌─────────────────────┐
//!                                      │ loop thread:        │
//!                                      │ handle_readable()   │
//!                                      │ drain, swap, run    │
//!                                      └─────────────────────┘
//! ```
//!
//! See [`trigger`] for the wake/drain protocol and [`signal_channel`] for the two
//! platform variants of the channel.
//!
//! [`Poll::poll()`]: mio::Poll::poll
//! [`pull()`]: Trigger::pull

// Enforce strict error handling in production library code only. Tests and examples are
// allowed to use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules (re-exported below to provide clean public API).
pub mod common;
pub mod log;
pub mod signal_channel;
pub mod trigger;

// Re-export stable public API using glob imports for ergonomic, flat API surface.
pub use common::*;
pub use log::*;
pub use signal_channel::*;
pub use trigger::*;
