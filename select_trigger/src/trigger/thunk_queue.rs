// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Debug, Formatter},
          sync::{Mutex, MutexGuard, PoisonError}};

/// A deferred unit of work handed from any thread to the loop thread.
///
/// Runs exactly once, on the loop thread, inside [`Trigger::handle_readable()`]. Return
/// an error (or panic) and it gets reported to the [`DiagnosticSink`] without affecting
/// the thunks queued after it.
///
/// [`DiagnosticSink`]: super::DiagnosticSink
/// [`Trigger::handle_readable()`]: super::Trigger::handle_readable
pub type Thunk = Box<dyn FnOnce() -> miette::Result<()> + Send + 'static>;

/// FIFO of pending [`Thunk`]s guarded by one mutex.
///
/// The lock is only ever held for a push or a swap, never while a thunk runs and never
/// across an OS read or write. [`take_all()`] swaps the whole collection for an empty
/// one, so a thunk pushed while the loop is running a drained batch simply lands in the
/// next batch.
///
/// A poisoned lock is recovered rather than propagated: no user code runs under it, so
/// the [`Vec`] inside is always consistent.
///
/// [`take_all()`]: Self::take_all
#[derive(Default)]
pub struct ThunkQueue {
    thunks: Mutex<Vec<Thunk>>,
}

impl Debug for ThunkQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThunkQueue")
            .field("len", &self.len())
            .finish()
    }
}

impl ThunkQueue {
    pub fn push(&self, thunk: Thunk) { self.lock().push(thunk); }

    /// Swaps the pending thunks out for an empty queue and returns them in insertion
    /// order.
    #[must_use]
    pub fn take_all(&self) -> Vec<Thunk> { std::mem::take(&mut *self.lock()) }

    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    fn lock(&self) -> MutexGuard<'_, Vec<Thunk>> {
        self.thunks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
