// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`tracing`] setup for binaries, demos and tests that drive a [`Trigger`]. The library
//! itself only emits events, it never installs a subscriber.
//!
//! [`Trigger`]: crate::Trigger

// Attach sources.
pub mod tracing_config;
pub mod tracing_init;

// Re-export.
pub use tracing_config::*;
pub use tracing_init::*;
