// Recurring and one-shot task scheduling, independent of any UI lifecycle
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type Task = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

/// Implementations must never run `task` from inside `schedule` or
/// `schedule_once`; callers may hold locks the task needs.
pub trait Scheduler: Send + Sync {
    /// Runs `task` right away, then every `interval` until cancelled.
    fn schedule(&self, task: Task, interval: Duration) -> ScheduleHandle;

    /// Runs `task` once after `delay` unless cancelled first.
    fn schedule_once(&self, task: Task, delay: Duration) -> ScheduleHandle;

    /// Stops a schedule. Unknown or finished handles are ignored.
    fn cancel(&self, handle: ScheduleHandle);
}

/// Scheduler backed by tokio timers on the given runtime.
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    jobs: Mutex<HashMap<ScheduleHandle, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn register(&self, job: impl FnOnce(ScheduleHandle) -> JoinHandle<()>) -> ScheduleHandle {
        let handle = ScheduleHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.retain(|_, join| !join.is_finished());
        jobs.insert(handle, job(handle));
        handle
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, task: Task, interval: Duration) -> ScheduleHandle {
        self.register(|handle| {
            tracing::debug!(?handle, ?interval, "schedule started");
            self.runtime.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    task();
                }
            })
        })
    }

    fn schedule_once(&self, task: Task, delay: Duration) -> ScheduleHandle {
        self.register(|_| {
            self.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                task();
            })
        })
    }

    fn cancel(&self, handle: ScheduleHandle) {
        let job = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if let Some(job) = job {
            job.abort();
            tracing::debug!(?handle, "schedule cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        let jobs = self.jobs.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, job) in jobs.drain() {
            job.abort();
        }
    }
}

/// Scheduler that only fires when told to. Test use only.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ManualScheduler {
    next_id: AtomicU64,
    jobs: Mutex<Vec<ManualJob>>,
}

#[cfg(test)]
struct ManualJob {
    handle: ScheduleHandle,
    task: Task,
    repeating: bool,
    period: Duration,
}

#[cfg(test)]
impl ManualScheduler {
    /// Fires every recurring schedule once.
    pub(crate) fn tick(&self) {
        self.fire(|job| job.repeating);
    }

    /// Fires and removes every pending one-shot.
    pub(crate) fn fire_one_shots(&self) {
        let due: Vec<Task> = {
            let mut jobs = self.jobs.lock().unwrap();
            let (once, rest): (Vec<_>, Vec<_>) = jobs.drain(..).partition(|j| !j.repeating);
            *jobs = rest;
            once.into_iter().map(|j| j.task).collect()
        };
        for task in due {
            task();
        }
    }

    pub(crate) fn recurring(&self) -> Vec<Duration> {
        self.periods(true)
    }

    pub(crate) fn one_shots(&self) -> Vec<Duration> {
        self.periods(false)
    }

    fn periods(&self, repeating: bool) -> Vec<Duration> {
        let jobs = self.jobs.lock().unwrap();
        jobs.iter()
            .filter(|j| j.repeating == repeating)
            .map(|j| j.period)
            .collect()
    }

    fn fire(&self, pick: impl Fn(&ManualJob) -> bool) {
        let due: Vec<Task> = {
            let jobs = self.jobs.lock().unwrap();
            jobs.iter().filter(|j| pick(j)).map(|j| j.task.clone()).collect()
        };
        for task in due {
            task();
        }
    }

    fn push(&self, task: Task, repeating: bool, period: Duration) -> ScheduleHandle {
        let handle = ScheduleHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.jobs.lock().unwrap().push(ManualJob {
            handle,
            task,
            repeating,
            period,
        });
        handle
    }
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
    fn schedule(&self, task: Task, interval: Duration) -> ScheduleHandle {
        self.push(task, true, interval)
    }

    fn schedule_once(&self, task: Task, delay: Duration) -> ScheduleHandle {
        self.push(task, false, delay)
    }

    fn cancel(&self, handle: ScheduleHandle) {
        self.jobs.lock().unwrap().retain(|j| j.handle != handle);
    }
}
