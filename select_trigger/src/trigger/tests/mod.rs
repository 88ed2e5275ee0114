// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Trigger`] tests that drive a real [`mio::Poll`] loop.
//!
//! - [`trigger_scenario_tests`]: one loop thread, a handful of producers, both channel
//!   kinds via [`test_case`].
//! - [`trigger_stress_tests`]: many producers racing a loop that drains in a tight
//!   cycle.
//!
//! Tests that construct a loopback channel are [`serial`] so they do not fight over the
//! candidate port range.
//!
//! [`Trigger`]: super::Trigger
//! [`serial`]: serial_test::serial
//! [`test_case`]: test_case::test_case

mod trigger_stress_tests;

pub(crate) use test_loop::*;
