// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deadline enforcement for pending operations.
//!
//! One background thread owns a min-heap of armed deadlines and a control
//! channel. When a deadline comes due the expiry callback fires with the
//! operation's correlation id; the owner maps that to
//! `finalize(DeadlineElapsed)`. Early finalization disarms the entry; a fire
//! that races a disarm is harmless because finalization is idempotent and
//! unknown correlation ids are ignored.

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Idle wait used when no deadline is armed.
const IDLE_WAIT: Duration = Duration::from_secs(60);

enum TimerCmd {
    Arm { id: String, deadline: Instant },
    Disarm { id: String },
    Shutdown,
}

/// Background deadline scheduler.
///
/// Dropping the timer stops and joins the worker thread; no armed deadline
/// survives shutdown.
pub(crate) struct DeadlineTimer {
    tx: Sender<TimerCmd>,
    handle: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    /// Spawn the worker. `on_expire` is invoked on the worker thread with
    /// the correlation id of each expired deadline; it must not block for
    /// long or later deadlines fire late.
    pub fn spawn<F>(on_expire: F) -> Self
    where
        F: Fn(String) + Send + 'static,
    {
        let (tx, rx) = channel::unbounded();
        let handle = thread::spawn(move || {
            let mut armed: HashMap<String, Instant> = HashMap::new();
            let mut queue: BinaryHeap<Reverse<(Instant, String)>> = BinaryHeap::new();

            loop {
                let wait = queue
                    .peek()
                    .map(|Reverse((deadline, _))| deadline.saturating_duration_since(Instant::now()))
                    .unwrap_or(IDLE_WAIT);

                match rx.recv_timeout(wait) {
                    Ok(TimerCmd::Arm { id, deadline }) => {
                        armed.insert(id.clone(), deadline);
                        queue.push(Reverse((deadline, id)));
                    }
                    Ok(TimerCmd::Disarm { id }) => {
                        // Heap entry stays behind and is skipped at fire time.
                        armed.remove(&id);
                    }
                    Ok(TimerCmd::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let now = Instant::now();
                while let Some(Reverse((deadline, _))) = queue.peek() {
                    if *deadline > now {
                        break;
                    }
                    let Some(Reverse((deadline, id))) = queue.pop() else {
                        break;
                    };
                    // Fire only entries still armed at this exact deadline;
                    // a re-armed id has a newer heap entry of its own.
                    if armed.get(&id) == Some(&deadline) {
                        armed.remove(&id);
                        on_expire(id);
                    }
                }
            }
        });

        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Arm (or re-arm) a deadline for `id`.
    pub fn arm(&self, id: &str, deadline: Instant) {
        let _ = self.tx.send(TimerCmd::Arm {
            id: id.to_owned(),
            deadline,
        });
    }

    /// Disarm the deadline for `id`, if any.
    pub fn disarm(&self, id: &str) {
        let _ = self.tx.send(TimerCmd::Disarm { id: id.to_owned() });
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        let _ = self.tx.send(TimerCmd::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
