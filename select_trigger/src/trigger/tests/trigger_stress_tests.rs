// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::TestLoop;
use crate::SignalChannelKind;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::{collections::HashSet,
          sync::{Arc, Barrier, Mutex},
          thread};

const PRODUCER_COUNT: usize = 128;

/// Every producer is released at once by a [`Barrier`] while the loop drains in a tight
/// cycle. Each thunk must be observed exactly once, on the loop thread.
fn assert_racing_producers_all_observed_once(kind: SignalChannelKind) {
    let mut test_loop = TestLoop::new();
    let (mut trigger, reports) = test_loop.new_trigger(kind);
    let observed = Arc::new(Mutex::new(vec![]));
    let start_line = Arc::new(Barrier::new(PRODUCER_COUNT));

    let producers: Vec<_> = (0..PRODUCER_COUNT)
        .map(|id| {
            let handle = trigger.handle();
            let observed = Arc::clone(&observed);
            let start_line = Arc::clone(&start_line);
            thread::spawn(move || {
                start_line.wait();
                handle.pull_with(move || {
                    observed.lock().unwrap().push((id, thread::current().id()));
                    Ok(())
                });
            })
        })
        .collect();

    let summaries =
        test_loop.run_until(&mut trigger, || observed.lock().unwrap().len() >= PRODUCER_COUNT);
    for producer in producers {
        producer.join().unwrap();
    }

    let loop_thread = thread::current().id();
    let observed = observed.lock().unwrap();
    let unique_ids: HashSet<usize> = observed.iter().map(|(id, _)| *id).collect();
    assert_eq!(observed.len(), PRODUCER_COUNT);
    assert_eq!(unique_ids.len(), PRODUCER_COUNT);
    assert!(observed.iter().all(|(_, thread_id)| *thread_id == loop_thread));
    assert_eq!(
        summaries.iter().map(|it| it.thunks_run).sum::<usize>(),
        PRODUCER_COUNT
    );
    assert_eq!(trigger.pending_thunks(), 0);
    assert!(reports.lock().unwrap().is_empty());
}

#[test]
fn test_racing_producers_platform_default() {
    assert_racing_producers_all_observed_once(SignalChannelKind::platform_default());
}

#[test]
#[serial]
fn test_racing_producers_loopback() {
    assert_racing_producers_all_observed_once(SignalChannelKind::Loopback);
}

/// Producers keep pulling while the loop drains; batches of different sizes interleave
/// with producer pushes, and the union must still be every thunk, once.
#[test]
fn test_sustained_pulls_across_many_cycles() {
    const THREADS: usize = 8;
    const PULLS_PER_THREAD: usize = 250;

    let mut test_loop = TestLoop::new();
    let (mut trigger, _reports) =
        test_loop.new_trigger(SignalChannelKind::platform_default());
    let observed = Arc::new(Mutex::new(vec![]));

    let producers: Vec<_> = (0..THREADS)
        .map(|thread_index| {
            let handle = trigger.handle();
            let observed = Arc::clone(&observed);
            thread::spawn(move || {
                for pull_index in 0..PULLS_PER_THREAD {
                    let observed = Arc::clone(&observed);
                    handle.pull_with(move || {
                        observed.lock().unwrap().push((thread_index, pull_index));
                        Ok(())
                    });
                }
            })
        })
        .collect();

    test_loop.run_until(&mut trigger, || {
        observed.lock().unwrap().len() >= THREADS * PULLS_PER_THREAD
    });
    for producer in producers {
        producer.join().unwrap();
    }

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), THREADS * PULLS_PER_THREAD);
    // Per producer, FIFO order holds across cycles.
    for thread_index in 0..THREADS {
        let order: Vec<usize> = observed
            .iter()
            .filter(|(t, _)| *t == thread_index)
            .map(|(_, p)| *p)
            .collect();
        assert_eq!(order, (0..PULLS_PER_THREAD).collect::<Vec<_>>());
    }
}
