//! Timer registry: the synchronized owner of timers, presets and the completion sink

use std::{
    collections::HashMap,
    sync::Arc,
    thread::{self, ThreadId},
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use super::{
    preset::{self, Preset},
    Timer, TimerId, TimerState,
};
use crate::{
    error::{Result, TimerError},
    services::{CompletionSink, PresetStore},
    tasks::TimerWorker,
};

/// Maximum number of live timers
pub const MAX_TIMERS: usize = 5;

/// Default tick interval
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// State reachable by both the registry and its workers
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    /// Broadcast on any state change a paused worker may be waiting for
    pub(crate) state_changed: Condvar,
    /// Broadcast whenever a worker thread deregisters itself
    pub(crate) worker_exited: Condvar,
    pub(crate) tick: Duration,
}

impl Shared {
    /// Bounded wait used by a paused worker before re-checking its timer
    pub(crate) fn pause_wait(&self) -> Duration {
        self.tick / 10
    }
}

/// A worker thread that has not yet left its tick loop
#[derive(Debug, Clone, Copy)]
struct LiveWorker {
    id: TimerId,
    run: u64,
    thread: ThreadId,
}

pub(crate) struct Inner {
    pub(crate) timers: Vec<Timer>,
    pub(crate) presets: Vec<Preset>,
    pub(crate) sink: Option<Arc<dyn CompletionSink>>,
    workers: HashMap<TimerId, TimerWorker>,
    /// Workers replaced by a restart before they were joined; joined on shutdown
    retired: Vec<TimerWorker>,
    live: Vec<LiveWorker>,
    next_id: u32,
    active: bool,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("timers", &self.timers)
            .field("presets", &self.presets)
            .field("sink", &self.sink.is_some())
            .field("workers", &self.workers.keys().collect::<Vec<_>>())
            .field("live", &self.live.len())
            .field("next_id", &self.next_id)
            .field("active", &self.active)
            .finish()
    }
}

impl Inner {
    fn timer_mut(&mut self, id: TimerId) -> Result<&mut Timer> {
        self.timers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimerError::TimerNotFound(id))
    }

    /// The timer a worker for `run` is still responsible for, if any
    pub(crate) fn bound_timer(&mut self, id: TimerId, run: u64) -> Option<&mut Timer> {
        if !self.active {
            return None;
        }
        self.timers
            .iter_mut()
            .find(|t| t.id == id)
            .filter(|t| t.run == run && t.state.is_active())
    }

    fn insert_timer(&mut self, name: String, total_secs: u64) -> Result<TimerId> {
        if self.timers.len() >= MAX_TIMERS {
            error!("Maximum timers ({}) reached", MAX_TIMERS);
            return Err(TimerError::CapacityExceeded { max: MAX_TIMERS });
        }

        let id = TimerId(self.next_id);
        self.next_id += 1;
        info!("Timer created: id={}, name={}, seconds={}", id, name, total_secs);
        self.timers.push(Timer::new(id, name, total_secs));
        Ok(id)
    }

    pub(crate) fn worker_exited(&mut self, id: TimerId, run: u64) {
        self.live.retain(|w| !(w.id == id && w.run == run));
    }

    /// Whether a worker for `id` at or before `run` is still ticking on another thread
    fn has_live_worker(&self, id: TimerId, run: u64, caller: ThreadId) -> bool {
        self.live
            .iter()
            .any(|w| w.id == id && w.run <= run && w.thread != caller)
    }

    fn reap_finished(&mut self) {
        self.retired.retain(|w| !w.is_finished());
    }
}

/// Owner of all timers and presets. Every operation is serialized by one lock.
///
/// Each started timer gets its own [`TimerWorker`] thread. Dropping the
/// registry shuts it down and joins every worker.
pub struct TimerRegistry {
    shared: Arc<Shared>,
    store: Box<dyn PresetStore>,
}

impl TimerRegistry {
    /// Create a registry ticking once per second
    pub fn new(store: impl PresetStore + 'static) -> Self {
        Self::with_tick(store, DEFAULT_TICK)
    }

    /// Create a registry with a custom tick interval
    pub fn with_tick(store: impl PresetStore + 'static, tick: Duration) -> Self {
        let store: Box<dyn PresetStore> = Box::new(store);
        let presets = load_presets(store.as_ref());

        let inner = Inner {
            timers: Vec::new(),
            presets,
            sink: None,
            workers: HashMap::new(),
            retired: Vec::new(),
            live: Vec::new(),
            next_id: 1,
            active: true,
        };

        info!("TimerService initialized (tick={:?})", tick);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                state_changed: Condvar::new(),
                worker_exited: Condvar::new(),
                tick,
            }),
            store,
        }
    }

    /// Create an idle timer
    pub fn create_timer(&self, name: impl Into<String>, total_secs: u64) -> Result<TimerId> {
        let mut inner = self.shared.inner.lock();
        inner.insert_timer(name.into(), total_secs)
    }

    /// Create an idle timer from a saved preset
    pub fn create_timer_from_predefined(&self, name: &str) -> Result<TimerId> {
        let mut inner = self.shared.inner.lock();
        let preset = inner
            .presets
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| {
                error!("Predefined timer {} not found", name);
                TimerError::PresetNotFound(name.to_string())
            })?;
        inner.insert_timer(preset.name, preset.secs)
    }

    /// Start counting. Elapsed time is kept; only [`stop_timer`](Self::stop_timer) resets it.
    pub fn start_timer(&self, id: TimerId) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        if !inner.active {
            return Err(TimerError::ServiceStopped);
        }

        let timer = inner.timer_mut(id)?;
        if timer.is_active() {
            error!("Timer {} already running", id);
            return Err(TimerError::AlreadyRunning(id));
        }
        let previous = timer.state;
        timer.state = TimerState::Running;
        timer.run += 1;
        let run = timer.run;

        let worker = match TimerWorker::spawn(Arc::clone(&self.shared), id, run) {
            Ok(worker) => worker,
            Err(e) => {
                error!("Failed to spawn worker for timer {}: {}", id, e);
                if let Ok(timer) = inner.timer_mut(id) {
                    timer.state = previous;
                }
                return Err(TimerError::WorkerSpawn(e));
            }
        };

        inner.live.push(LiveWorker {
            id,
            run,
            thread: worker.thread_id(),
        });
        // A completed run's worker may still be delivering its notification.
        if let Some(old) = inner.workers.insert(id, worker) {
            inner.retired.push(old);
        }
        inner.reap_finished();

        info!("Timer {} started", id);
        Ok(())
    }

    /// Suspend counting without ending the worker
    pub fn pause_timer(&self, id: TimerId) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        let timer = inner.timer_mut(id)?;
        if !timer.is_active() {
            return Err(TimerError::NotRunning(id));
        }
        timer.state = TimerState::Paused;
        info!("Timer {} paused", id);
        Ok(())
    }

    /// Continue counting and wake the paused worker
    pub fn resume_timer(&self, id: TimerId) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        let timer = inner.timer_mut(id)?;
        if !timer.is_active() {
            return Err(TimerError::NotRunning(id));
        }
        timer.state = TimerState::Running;
        self.shared.state_changed.notify_all();
        info!("Timer {} resumed", id);
        Ok(())
    }

    /// Stop counting and reset elapsed time. Returns once every worker of the timer has exited.
    pub fn stop_timer(&self, id: TimerId) -> Result<()> {
        let (worker, run) = {
            let mut inner = self.shared.inner.lock();
            let timer = inner.timer_mut(id)?;
            reset(timer);
            let run = timer.run;
            let worker = inner.workers.remove(&id);
            self.shared.state_changed.notify_all();
            (worker, run)
        };

        // Joined without the lock so other operations are not held up by the wait.
        if let Some(worker) = worker {
            worker.join();
        }
        // A concurrent stop may hold the handle, or a restart may have retired it.
        self.wait_for_exit(id, run);

        info!("Timer {} stopped", id);
        Ok(())
    }

    /// Stop the timer, then remove it. The id is never handed out again.
    pub fn delete_timer(&self, id: TimerId) -> Result<()> {
        let (worker, run) = {
            let mut inner = self.shared.inner.lock();
            let timer = inner.timer_mut(id)?;
            reset(timer);
            let run = timer.run;
            inner.timers.retain(|t| t.id != id);
            let worker = inner.workers.remove(&id);
            self.shared.state_changed.notify_all();
            (worker, run)
        };

        if let Some(worker) = worker {
            worker.join();
        }
        self.wait_for_exit(id, run);

        info!("Timer {} deleted", id);
        Ok(())
    }

    /// Block until no worker for `id` started at or before `run` is still ticking.
    /// A worker calling this from its own completion handler is not waited for.
    fn wait_for_exit(&self, id: TimerId, run: u64) {
        let caller = thread::current().id();
        let mut inner = self.shared.inner.lock();
        while inner.has_live_worker(id, run, caller) {
            self.shared.worker_exited.wait(&mut inner);
        }
    }

    /// Snapshot of one timer
    pub fn get_timer(&self, id: TimerId) -> Option<Timer> {
        let inner = self.shared.inner.lock();
        inner.timers.iter().find(|t| t.id == id).cloned()
    }

    /// Snapshots of all timers in creation order
    pub fn get_all_timers(&self) -> Vec<Timer> {
        self.shared.inner.lock().timers.clone()
    }

    /// True only while the timer is counting (running and not paused)
    pub fn is_timer_running(&self, id: TimerId) -> bool {
        let inner = self.shared.inner.lock();
        inner.timers.iter().any(|t| t.id == id && t.is_running())
    }

    /// Completion percentage, `None` for an unknown timer
    pub fn get_timer_progress(&self, id: TimerId) -> Option<u8> {
        let inner = self.shared.inner.lock();
        inner.timers.iter().find(|t| t.id == id).map(Timer::progress)
    }

    /// Insert or overwrite a preset by name. Persistence failures are logged, never returned.
    pub fn save_predefined_timer(&self, name: impl Into<String>, secs: u64) {
        let name = name.into();
        let mut inner = self.shared.inner.lock();
        let replaced = preset::upsert(&mut inner.presets, &name, secs);
        self.persist(&inner.presets);
        info!(
            "Predefined timer {}: {} = {} seconds",
            if replaced { "updated" } else { "saved" },
            name,
            secs
        );
    }

    pub fn delete_predefined_timer(&self, name: &str) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        let index = inner
            .presets
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| TimerError::PresetNotFound(name.to_string()))?;
        inner.presets.remove(index);
        self.persist(&inner.presets);
        info!("Predefined timer deleted: {}", name);
        Ok(())
    }

    pub fn get_predefined_timers(&self) -> Vec<Preset> {
        self.shared.inner.lock().presets.clone()
    }

    /// Install the completion handler, replacing any previous one
    pub fn set_completion_sink(&self, sink: impl CompletionSink + 'static) {
        self.shared.inner.lock().sink = Some(Arc::new(sink));
        debug!("Completion sink installed");
    }

    pub fn clear_completion_sink(&self) {
        self.shared.inner.lock().sink = None;
    }

    /// Number of worker threads that have not exited yet
    pub fn active_workers(&self) -> usize {
        self.shared.inner.lock().live.len()
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.tick
    }

    /// Stop every worker and wait for all of them. Later starts fail with
    /// [`TimerError::ServiceStopped`]. Safe to call more than once.
    pub fn shutdown(&self) {
        let workers: Vec<TimerWorker> = {
            let mut inner = self.shared.inner.lock();
            if !inner.active
                && inner.workers.is_empty()
                && inner.retired.is_empty()
                && inner.live.is_empty()
            {
                return;
            }
            inner.active = false;
            for timer in inner.timers.iter_mut().filter(|t| t.is_active()) {
                timer.state = TimerState::Stopped;
            }
            self.shared.state_changed.notify_all();

            let mut workers: Vec<TimerWorker> = inner.workers.drain().map(|(_, w)| w).collect();
            workers.append(&mut inner.retired);
            workers
        };

        let count = workers.len();
        for worker in workers {
            worker.join();
        }
        // Another shutdown or stop may have taken handles this call never saw.
        let caller = thread::current().id();
        let mut inner = self.shared.inner.lock();
        while inner.live.iter().any(|w| w.thread != caller) {
            self.shared.worker_exited.wait(&mut inner);
        }
        drop(inner);
        info!("TimerService shut down ({} workers joined)", count);
    }

    fn persist(&self, presets: &[Preset]) {
        if let Err(e) = self.store.save(presets) {
            warn!("Failed to save predefined timers: {}", e);
        }
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Force a timer out of its run: not running, not paused, elapsed back to zero
fn reset(timer: &mut Timer) {
    if timer.state != TimerState::Idle {
        timer.state = TimerState::Stopped;
    }
    timer.elapsed_secs = 0;
}

fn load_presets(store: &dyn PresetStore) -> Vec<Preset> {
    match store.load() {
        Ok(presets) if !presets.is_empty() => presets,
        Ok(_) => {
            let defaults = Preset::defaults();
            info!("No saved presets, creating {} defaults", defaults.len());
            if let Err(e) = store.save(&defaults) {
                warn!("Failed to save default presets: {}", e);
            }
            defaults
        }
        Err(e) => {
            // Keep whatever is on disk untouched; the next explicit save overwrites it.
            error!("Failed to load presets, using defaults: {}", e);
            Preset::defaults()
        }
    }
}
