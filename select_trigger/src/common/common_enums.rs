// Copyright (c) 2023-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Control flow signal for the event loop that owns a [`Trigger`].
///
/// Returned by [`Trigger::handle_event()`] so the loop can tell whether the trigger is
/// still usable after dispatching one of its events.
///
/// [`Trigger`]: crate::Trigger
/// [`Trigger::handle_event()`]: crate::Trigger::handle_event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Continue to the next iteration.
    #[default]
    Continue,

    /// Stop processing. The trigger has been closed and will not wake the loop again.
    Stop,
}
