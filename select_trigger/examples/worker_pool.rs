// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A handful of worker threads compute results and hand them to a single-threaded
//! [`mio`] loop through a [`Trigger`]. The loop's outbox is a plain [`RefCell`] in a
//! [`thread_local!`]: only the loop thread ever touches it, because thunks run there.
//!
//! ```sh
//! cargo run --example worker_pool
//! ```

use mio::{Events, Poll, Token};
use r3bl_select_trigger::{Continuation, TracingConfig, Trigger,
                          try_initialize_logging_global};
use std::{cell::RefCell, thread, time::Duration};

const TRIGGER_TOKEN: Token = Token(0);
const WORKER_COUNT: usize = 4;

thread_local! {
    /// Loop-owned state. Never shared, never locked.
    static OUTBOX: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn main() -> miette::Result<()> {
    try_initialize_logging_global(TracingConfig::default())?;

    let mut poll = Poll::new().map_err(|e| miette::miette!("failed to create poll: {e}"))?;
    let mut trigger = Trigger::new(poll.registry(), TRIGGER_TOKEN)?;
    tracing::info!(message = "event loop ready", trigger = %trigger);

    let workers: Vec<_> = (0..WORKER_COUNT)
        .map(|worker_id| {
            let handle = trigger.handle();
            thread::spawn(move || {
                // Pretend to do something slow.
                thread::sleep(Duration::from_millis(20 * (worker_id as u64 + 1)));
                let result = format!("worker {worker_id}: {}", (worker_id + 1).pow(2));
                handle.pull_with(move || {
                    OUTBOX.with_borrow_mut(|outbox| outbox.push(result));
                    Ok(())
                });
            })
        })
        .collect();

    let mut events = Events::with_capacity(64);
    let mut flushed_total = 0;
    'event_loop: loop {
        poll.poll(&mut events, None)
            .map_err(|e| miette::miette!("poll failed: {e}"))?;

        for event in &events {
            if trigger.handle_event(event) == Some(Continuation::Stop) {
                break 'event_loop;
            }
        }

        // Send whatever the workers produced. Here "send" is just logging it.
        let flushed = OUTBOX.with_borrow_mut(std::mem::take);
        for message in &flushed {
            tracing::info!(message = "flushing result", result = %message);
        }

        flushed_total += flushed.len();
        if flushed_total == WORKER_COUNT {
            break 'event_loop;
        }
    }

    for worker in workers {
        worker
            .join()
            .map_err(|_| miette::miette!("worker thread panicked"))?;
    }
    trigger.close();
    tracing::info!(message = "all results flushed, trigger closed");

    Ok(())
}
