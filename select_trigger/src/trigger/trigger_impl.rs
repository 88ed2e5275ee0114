// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words wakeup wakeups

use super::{DEBUG_TRIGGER_SHOW_WAKEUPS, DiagnosticSink, Thunk, ThunkExecutionError,
            ThunkQueue, TracingDiagnosticSink, TriggerConfig, TriggerError};
use crate::{Continuation, SignalChannel, SignalChannelKind, SignalReader, SignalWriter};
use mio::{Interest, Registry, Token, event::Event};
use std::{fmt::{Debug, Display, Formatter},
          panic::{AssertUnwindSafe, catch_unwind},
          sync::{Arc, PoisonError, RwLock,
                 atomic::{AtomicBool, Ordering}}};

/// Result of one [`Trigger::handle_readable()`] cycle. Callers are free to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    /// Wakeup bytes read and discarded. Several pulls may have coalesced.
    pub bytes_drained: usize,
    /// Thunks executed this cycle, including the ones that failed.
    pub thunks_run: usize,
    /// Thunks that returned an error or panicked.
    pub thunks_failed: usize,
    /// The write end of the channel is gone.
    pub peer_closed: bool,
}

/// Cross-thread wakeup for one [`mio::Poll`] event loop.
///
/// Owned by the loop. Producer threads get a [`TriggerHandle`] via [`handle()`]. See
/// the [module docs] for the wake/drain protocol.
///
/// # Lifecycle
///
/// `Open → Closed`, one way. [`close()`] is idempotent and also runs on [`Drop`]. While
/// open, the thunk queue cycles `Empty → Pending → (drain) → Empty`.
///
/// [`close()`]: Self::close
/// [`handle()`]: Self::handle
/// [module docs]: super
pub struct Trigger {
    shared: Arc<TriggerShared>,
    /// [`None`] once closed.
    reader: Option<SignalReader>,
    /// Clone of the owning loop's registry, for deregistering on close.
    registry: Registry,
    drain_buffer: Vec<u8>,
    sink: Box<dyn DiagnosticSink>,
}

/// Producer-side view of a [`Trigger`]: cheap to [`Clone`], [`Send`] + [`Sync`].
///
/// Pulling through a handle after its trigger closed is a no-op.
#[derive(Clone)]
pub struct TriggerHandle {
    shared: Arc<TriggerShared>,
}

/// State shared across the thread boundary. Everything else in [`Trigger`] is touched by
/// the loop thread only.
struct TriggerShared {
    kind: SignalChannelKind,
    token: Token,
    thunks: ThunkQueue,
    /// Taken (and thereby released) by [`Trigger::close()`]. Producers only ever take
    /// the read side, so they never wait on each other.
    writer: RwLock<Option<SignalWriter>>,
    closed: AtomicBool,
}

impl TriggerShared {
    fn pull_trigger(&self, maybe_thunk: Option<Thunk>) {
        if self.closed.load(Ordering::Acquire) {
            DEBUG_TRIGGER_SHOW_WAKEUPS.then(|| {
                tracing::debug!(
                    message = "pull on closed trigger ignored",
                    token = ?self.token,
                    had_thunk = maybe_thunk.is_some()
                );
            });
            return;
        }

        // The thunk must be queued before the byte goes out, so that whichever drain
        // observes the byte also observes the thunk.
        if let Some(thunk) = maybe_thunk {
            self.thunks.push(thunk);
        }

        let writer_guard = self.writer.read().unwrap_or_else(PoisonError::into_inner);
        let Some(writer) = writer_guard.as_ref() else {
            return;
        };
        if let Err(err) = writer.write_byte() {
            tracing::warn!(
                message = "failed to write trigger wakeup byte",
                kind = %self.kind,
                token = ?self.token,
                error = ?err
            );
        }
    }

    fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

impl Display for TriggerShared {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<select-trigger ({}) at token {}>", self.kind, self.token.0)
    }
}

impl Trigger {
    /// Creates the platform's signal channel and registers its read end with
    /// `registry` under `token`, readable interest only. Failures in thunks go to
    /// [`TracingDiagnosticSink`].
    ///
    /// # Errors
    ///
    /// See [`TriggerError`]. Nothing is left registered or open on error.
    pub fn new(registry: &Registry, token: Token) -> Result<Self, TriggerError> {
        Self::try_new_with(registry, token, TriggerConfig::default(), TracingDiagnosticSink)
    }

    /// Like [`new()`], with explicit configuration and diagnostic sink.
    ///
    /// # Errors
    ///
    /// See [`TriggerError`]. Nothing is left registered or open on error.
    ///
    /// [`new()`]: Self::new
    pub fn try_new_with(
        registry: &Registry,
        token: Token,
        config: TriggerConfig,
        sink: impl DiagnosticSink,
    ) -> Result<Self, TriggerError> {
        let registry = registry.try_clone().map_err(TriggerError::Registration)?;

        let (mut reader, writer) =
            SignalChannel::create(config.channel_kind, config.loopback_ports)?.into_split();
        let kind = reader.kind();

        registry
            .register(&mut reader, token, Interest::READABLE)
            .map_err(TriggerError::Registration)?;

        DEBUG_TRIGGER_SHOW_WAKEUPS.then(|| {
            tracing::debug!(message = "trigger registered", kind = %kind, token = ?token);
        });

        Ok(Self {
            shared: Arc::new(TriggerShared {
                kind,
                token,
                thunks: ThunkQueue::default(),
                writer: RwLock::new(Some(writer)),
                closed: AtomicBool::new(false),
            }),
            reader: Some(reader),
            registry,
            drain_buffer: vec![0; config.effective_drain_buffer_size()],
            sink: Box::new(sink),
        })
    }

    /// A new producer-side handle sharing this trigger's queue and channel.
    #[must_use]
    pub fn handle(&self) -> TriggerHandle {
        TriggerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Wakes the loop without scheduling any work.
    pub fn pull(&self) { self.shared.pull_trigger(None); }

    /// Wakes the loop and has it run `thunk` on the loop thread.
    pub fn pull_with(&self, thunk: impl FnOnce() -> miette::Result<()> + Send + 'static) {
        self.shared.pull_trigger(Some(Box::new(thunk)));
    }

    /// Wakes the loop, queueing `maybe_thunk` first if there is one.
    pub fn pull_trigger(&self, maybe_thunk: Option<Thunk>) {
        self.shared.pull_trigger(maybe_thunk);
    }

    /// Handles the trigger's token becoming readable. Call this from the loop thread
    /// only.
    ///
    /// 1. Reads and discards every available wakeup byte. A read error is logged and
    ///    treated as nothing to read.
    /// 2. Swaps the pending thunks out of the queue.
    /// 3. Runs them in order. A thunk returning [`Err`] or panicking is reported to the
    ///    [`DiagnosticSink`] and the rest still run.
    ///
    /// Thunks pulled while step 3 is underway run on the next cycle. Returns an empty
    /// summary once closed.
    pub fn handle_readable(&mut self) -> DrainSummary {
        let Some(reader) = self.reader.as_mut() else {
            return DrainSummary::default();
        };

        let mut summary = DrainSummary::default();
        match reader.drain(&mut self.drain_buffer) {
            Ok(outcome) => {
                summary.bytes_drained = outcome.bytes_drained;
                summary.peer_closed = outcome.peer_closed;
            }
            Err(err) => {
                summary.bytes_drained = err.bytes_drained;
                tracing::warn!(
                    message = "trigger drain read failed, treating as empty",
                    token = ?self.shared.token,
                    error = ?err
                );
            }
        }

        let thunks = self.shared.thunks.take_all();
        for (position, thunk) in thunks.into_iter().enumerate() {
            summary.thunks_run += 1;
            if let Err(err) = run_thunk(position, thunk) {
                summary.thunks_failed += 1;
                self.sink.report(err.kind(), err.to_string());
            }
        }

        DEBUG_TRIGGER_SHOW_WAKEUPS.then(|| {
            tracing::debug!(
                message = "trigger drained",
                token = ?self.shared.token,
                summary = ?summary
            );
        });

        summary
    }

    /// Dispatch glue for the loop's event iteration.
    ///
    /// Returns [`None`] if `event` belongs to some other source. For the trigger's own
    /// token: runs [`handle_readable()`] when readable, then closes the trigger if the
    /// channel reports that its write side is gone ([`Continuation::Stop`]).
    ///
    /// [`handle_readable()`]: Self::handle_readable
    pub fn handle_event(&mut self, event: &Event) -> Option<Continuation> {
        if event.token() != self.shared.token {
            return None;
        }
        if self.is_closed() {
            return Some(Continuation::Stop);
        }

        let peer_closed = event.is_readable() && self.handle_readable().peer_closed;
        if peer_closed || event.is_read_closed() || event.is_error() {
            tracing::warn!(
                message = "trigger signal channel closed by peer, closing trigger",
                token = ?self.shared.token
            );
            self.close();
            return Some(Continuation::Stop);
        }

        Some(Continuation::Continue)
    }

    /// Deregisters the read end from the loop and releases both channel ends. Thunks
    /// still queued are dropped without running. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(mut reader) = self.reader.take() {
            if let Err(err) = self.registry.deregister(&mut reader) {
                tracing::warn!(
                    message = "failed to deregister trigger",
                    token = ?self.shared.token,
                    error = ?err
                );
            }
            drop(reader);
        }

        let writer = self
            .shared
            .writer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(writer);

        let discarded = self.shared.thunks.take_all().len();
        DEBUG_TRIGGER_SHOW_WAKEUPS.then(|| {
            tracing::debug!(
                message = "trigger closed",
                token = ?self.shared.token,
                discarded_thunks = discarded
            );
        });
    }

    /// Whether [`close()`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shared.is_closed() }

    /// Thunks queued and not yet swapped out by a drain.
    #[must_use]
    pub fn pending_thunks(&self) -> usize { self.shared.thunks.len() }

    /// The variant of signal channel backing this trigger.
    #[must_use]
    pub fn channel_kind(&self) -> SignalChannelKind { self.shared.kind }

    /// The token the read end is registered under.
    #[must_use]
    pub fn token(&self) -> Token { self.shared.token }
}

fn run_thunk(position: usize, thunk: Thunk) -> Result<(), ThunkExecutionError> {
    match catch_unwind(AssertUnwindSafe(thunk)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(report)) => Err(ThunkExecutionError::Failed { position, report }),
        Err(panic_payload) => {
            let payload = panic_payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic payload>".to_string());
            Err(ThunkExecutionError::Panicked { position, payload })
        }
    }
}

impl Drop for Trigger {
    fn drop(&mut self) { self.close(); }
}

impl Display for Trigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.shared, f)
    }
}

impl Debug for Trigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("kind", &self.shared.kind)
            .field("token", &self.shared.token)
            .field("closed", &self.is_closed())
            .field("pending_thunks", &self.pending_thunks())
            .finish_non_exhaustive()
    }
}

impl TriggerHandle {
    /// Wakes the loop without scheduling any work.
    pub fn pull(&self) { self.shared.pull_trigger(None); }

    /// Wakes the loop and has it run `thunk` on the loop thread.
    pub fn pull_with(&self, thunk: impl FnOnce() -> miette::Result<()> + Send + 'static) {
        self.shared.pull_trigger(Some(Box::new(thunk)));
    }

    /// Wakes the loop, queueing `maybe_thunk` first if there is one.
    pub fn pull_trigger(&self, maybe_thunk: Option<Thunk>) {
        self.shared.pull_trigger(maybe_thunk);
    }

    /// Whether the owning [`Trigger`] has closed. Pulls are ignored from then on.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shared.is_closed() }

    /// Thunks queued and not yet swapped out by a drain.
    #[must_use]
    pub fn pending_thunks(&self) -> usize { self.shared.thunks.len() }

    /// The variant of signal channel backing the owning [`Trigger`].
    #[must_use]
    pub fn channel_kind(&self) -> SignalChannelKind { self.shared.kind }
}

impl Display for TriggerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.shared, f)
    }
}

impl Debug for TriggerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerHandle")
            .field("kind", &self.shared.kind)
            .field("token", &self.shared.token)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::tests::{TRIGGER_TOKEN, TestLoop, WAKEUP_TIMEOUT};
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::{io::Write as _,
              sync::atomic::AtomicUsize,
              thread,
              time::Duration};
    use test_case::test_case;

    /// Drops the producer side of the channel without closing the trigger, as if the
    /// other end had gone away on its own.
    fn drop_writer(trigger: &Trigger) {
        let writer = trigger
            .shared
            .writer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        assert!(writer.is_some());
        drop(writer);
    }

    #[cfg_attr(unix, test_case(SignalChannelKind::Pipe ; "pipe"))]
    #[test_case(SignalChannelKind::Loopback ; "loopback")]
    #[serial]
    fn test_peer_close_stops_and_closes_trigger(kind: SignalChannelKind) {
        let mut test_loop = TestLoop::new();
        let (mut trigger, _reports) = test_loop.new_trigger(kind);
        let handle = trigger.handle();

        drop_writer(&trigger);

        let mut continuation = None;
        let deadline = std::time::Instant::now() + WAKEUP_TIMEOUT;
        while continuation.is_none() {
            assert!(std::time::Instant::now() < deadline, "peer close never observed");
            test_loop
                .poll
                .poll(&mut test_loop.events, Some(Duration::from_millis(50)))
                .unwrap();
            for event in &test_loop.events {
                if event.token() == TRIGGER_TOKEN {
                    continuation = trigger.handle_event(event);
                }
            }
        }

        assert_eq!(continuation, Some(Continuation::Stop));
        assert!(trigger.is_closed());
        assert!(handle.is_closed());
        // Still safe after the automatic close.
        trigger.close();
        handle.pull();
    }

    #[test]
    #[serial]
    fn test_drain_error_still_runs_queued_thunks() {
        let test_loop = TestLoop::new();
        let (mut trigger, reports) = test_loop.new_trigger(SignalChannelKind::Loopback);
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);
        trigger.pull_with(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        // Closing a socket with unread data in its receive buffer makes the kernel
        // answer with a reset instead of a clean shutdown, so the next read on the
        // reader fails with `ConnectionReset`.
        let Some(SignalReader::Loopback(reader_stream)) = trigger.reader.as_mut() else {
            panic!("expected a loopback reader");
        };
        reader_stream.write_all(b"unread").unwrap();
        thread::sleep(Duration::from_millis(50));
        drop_writer(&trigger);
        thread::sleep(Duration::from_millis(50));

        let summary = trigger.handle_readable();

        assert_eq!(summary.thunks_run, 1);
        assert_eq!(summary.thunks_failed, 0);
        assert!(!summary.peer_closed);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(trigger.pending_thunks(), 0);
        assert!(reports.lock().unwrap().is_empty());
        assert!(!trigger.is_closed());
    }
}
