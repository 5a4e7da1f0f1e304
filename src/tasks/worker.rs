//! Per-timer worker thread
//!
//! One worker ticks exactly one timer. It only holds the timer id and the run
//! number it was started for, and reaches timer state through the registry's
//! shared lock. The lock is released while sleeping between ticks.

use std::{
    sync::Arc,
    thread::{self, JoinHandle, ThreadId},
    time::Instant,
};

use tracing::{debug, error, info};

use crate::state::{registry::Shared, TimerId, TimerState};

/// Handle to a spawned worker
#[derive(Debug)]
pub struct TimerWorker {
    id: TimerId,
    handle: JoinHandle<()>,
}

impl TimerWorker {
    /// Spawn a worker bound to `id` for the given run
    pub(crate) fn spawn(shared: Arc<Shared>, id: TimerId, run: u64) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("timer-{}", id))
            .spawn(move || tick_loop(shared, id, run))?;
        Ok(Self { id, handle })
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.handle.thread().id()
    }

    /// Wait for the worker thread to exit
    pub fn join(self) {
        if self.thread_id() == thread::current().id() {
            // Called from this worker's own completion handler; it exits right after.
            debug!("Timer {} worker not joined from its own thread", self.id);
            return;
        }
        if self.handle.join().is_err() {
            error!("Timer {} worker panicked", self.id);
        }
    }
}

/// Deregisters the worker when `tick_loop` returns or unwinds
struct ExitGuard<'a> {
    shared: &'a Shared,
    id: TimerId,
    run: u64,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock();
        inner.worker_exited(self.id, self.run);
        self.shared.worker_exited.notify_all();
    }
}

fn tick_loop(shared: Arc<Shared>, id: TimerId, run: u64) {
    debug!("Timer worker started for timer {}", id);
    let _exit = ExitGuard { shared: &shared, id, run };

    let tick = shared.tick;
    let pause_wait = shared.pause_wait();
    let mut cycle = Instant::now();

    loop {
        thread::sleep(tick.saturating_sub(cycle.elapsed()));
        cycle = Instant::now();

        let mut inner = shared.inner.lock();

        let paused = match inner.bound_timer(id, run) {
            Some(timer) => timer.state == TimerState::Paused,
            None => break,
        };
        if paused {
            shared.state_changed.wait_for(&mut inner, pause_wait);
        }

        // Stop, delete or shutdown may have happened while waiting.
        let Some(timer) = inner.bound_timer(id, run) else {
            break;
        };
        if timer.state != TimerState::Running {
            continue;
        }

        timer.elapsed_secs = (timer.elapsed_secs + 1).min(timer.total_secs);
        debug!("Timer {}: {}/{} seconds", id, timer.elapsed_secs, timer.total_secs);

        if timer.elapsed_secs >= timer.total_secs {
            timer.state = TimerState::Completed;
            let name = timer.name.clone();
            let sink = inner.sink.clone();
            drop(inner);

            info!("Timer {} ({}) completed", id, name);
            if let Some(sink) = sink {
                sink.on_complete(id, &name);
            }
            break;
        }
    }

    debug!("Timer worker for timer {} exiting", id);
}
