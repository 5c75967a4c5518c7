// Polling controller - Refresh loop, request supersession and error state
use crate::application::cancellation::CancellationToken;
use crate::application::error::FetchError;
use crate::application::measurement_source::MeasurementSource;
use crate::application::scheduler::{ScheduleHandle, Scheduler, Task};
use crate::application::store::SharedStore;
use crate::domain::measurement::{LatestSnapshot, Measurement, TimeSeries};
use crate::domain::range::TimeRange;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct PollingConfig {
    pub interval: Duration,
    /// Delay before retrying a role whose first load for the current
    /// parameters failed.
    pub retry_delay: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollParameters {
    pub range: TimeRange,
    pub live: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    Idle,
    Fetching,
    Succeeded,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Latest,
    Series,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Latest => f.write_str("latest measurement"),
            Role::Series => f.write_str("measurement history"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchStatus {
    pub running: bool,
    pub parameters: PollParameters,
    pub latest: FetchPhase,
    pub series: FetchPhase,
    /// Newest failure among roles that have not recovered since.
    pub error: Option<String>,
}

/// The single outstanding request of one role. A response is applied only
/// if its generation is still the slot's current one.
#[derive(Debug)]
struct RequestSlot {
    generation: u64,
    token: Option<CancellationToken>,
    phase: FetchPhase,
    loaded: bool,
    /// Failure sequence number and message, until this role next succeeds.
    error: Option<(u64, String)>,
}

impl RequestSlot {
    fn new() -> Self {
        Self {
            generation: 0,
            token: None,
            phase: FetchPhase::Idle,
            loaded: false,
            error: None,
        }
    }

    /// Cancels whatever is pending and opens a new generation.
    fn begin(&mut self) -> (u64, CancellationToken) {
        self.supersede();
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        self.phase = FetchPhase::Fetching;
        (self.generation, token)
    }

    fn supersede(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
            if self.phase == FetchPhase::Fetching {
                self.phase = FetchPhase::Cancelled;
            }
        }
        self.generation += 1;
    }

    /// Stops tracking the role entirely: nothing pending, no error kept.
    fn withdraw(&mut self) {
        self.supersede();
        self.phase = FetchPhase::Idle;
        self.error = None;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
            && self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn finish(&mut self, phase: FetchPhase) {
        self.token = None;
        self.phase = phase;
    }
}

struct ControllerState {
    running: bool,
    parameters: PollParameters,
    latest: RequestSlot,
    series: RequestSlot,
    failures: u64,
    ticker: Option<ScheduleHandle>,
    retry: Option<ScheduleHandle>,
}

impl ControllerState {
    fn slot(&mut self, role: Role) -> &mut RequestSlot {
        match role {
            Role::Latest => &mut self.latest,
            Role::Series => &mut self.series,
        }
    }

    fn error(&self) -> Option<String> {
        [&self.latest.error, &self.series.error]
            .into_iter()
            .flatten()
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, message)| message.clone())
    }
}

struct Shared {
    source: Arc<dyn MeasurementSource>,
    store: SharedStore,
    scheduler: Arc<dyn Scheduler>,
    config: PollingConfig,
    state: Mutex<ControllerState>,
}

/// Owns the refresh loop. Each cycle fetches the latest snapshot, plus the
/// range series when live mode is on; any request left over from the
/// previous cycle is cancelled first and its response is discarded.
pub struct PollingController {
    shared: Arc<Shared>,
}

impl PollingController {
    pub fn new(
        source: Arc<dyn MeasurementSource>,
        store: SharedStore,
        scheduler: Arc<dyn Scheduler>,
        config: PollingConfig,
    ) -> Self {
        let state = ControllerState {
            running: false,
            parameters: PollParameters {
                range: TimeRange::default(),
                live: true,
            },
            latest: RequestSlot::new(),
            series: RequestSlot::new(),
            failures: 0,
            ticker: None,
            retry: None,
        };

        Self {
            shared: Arc::new(Shared {
                source,
                store,
                scheduler,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn start(&self, range: TimeRange, live: bool) {
        tracing::info!(%range, live, "starting measurement polling");
        let mut state = self.shared.lock();
        if state.parameters.range != range {
            state.series.loaded = false;
        }
        state.running = true;
        state.parameters = PollParameters { range, live };
        self.shared.restart(&mut state);
    }

    /// Switches range or live mode. While running, the cycle restarts
    /// immediately; while stopped, the parameters apply on the next `start`.
    pub fn update_parameters(&self, range: TimeRange, live: bool) {
        let mut state = self.shared.lock();
        let next = PollParameters { range, live };
        if next.range != state.parameters.range {
            state.series.loaded = false;
        }
        state.parameters = next;
        if !live {
            state.series.withdraw();
        }

        if state.running {
            tracing::info!(%range, live, "polling parameters changed");
            self.shared.restart(&mut state);
        }
    }

    pub fn stop(&self) {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        if !state.running {
            return;
        }
        state.running = false;
        self.shared.cancel_schedules(state);
        state.latest.withdraw();
        state.series.withdraw();
        tracing::info!("measurement polling stopped");
    }

    pub fn parameters(&self) -> PollParameters {
        self.shared.lock().parameters
    }

    pub fn status(&self) -> FetchStatus {
        let state = self.shared.lock();
        FetchStatus {
            running: state.running,
            parameters: state.parameters,
            latest: state.latest.phase,
            series: state.series.phase,
            error: state.error(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.shared.store
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_schedules(&self, state: &mut ControllerState) {
        if let Some(handle) = state.ticker.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = state.retry.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Replaces the recurring schedule; its first run is immediate.
    fn restart(self: &Arc<Self>, state: &mut ControllerState) {
        self.cancel_schedules(state);
        let weak = Arc::downgrade(self);
        let task: Task = Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.run_cycle();
            }
        });
        state.ticker = Some(self.scheduler.schedule(task, self.config.interval));
    }

    fn schedule_retry(self: &Arc<Self>, state: &mut ControllerState) {
        if state.retry.is_some() {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        let task: Task = Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.lock().retry = None;
                shared.run_cycle();
            }
        });
        tracing::info!(delay = ?self.config.retry_delay, "initial load failed, retrying early");
        state.retry = Some(self.scheduler.schedule_once(task, self.config.retry_delay));
    }

    fn run_cycle(self: &Arc<Self>) {
        let (parameters, latest, series) = {
            let mut state = self.lock();
            if !state.running {
                return;
            }
            let latest = state.latest.begin();
            let series = if state.parameters.live {
                Some(state.series.begin())
            } else {
                state.series.withdraw();
                None
            };
            (state.parameters, latest, series)
        };
        tracing::debug!(range = %parameters.range, live = parameters.live, "poll cycle");

        let (generation, token) = latest;
        let shared = self.clone();
        tokio::spawn(async move {
            let result = token.guard(shared.source.fetch_latest(&token)).await;
            shared.apply_latest(generation, result);
        });

        if let Some((generation, token)) = series {
            let shared = self.clone();
            let range = parameters.range;
            tokio::spawn(async move {
                let result = token.guard(shared.source.fetch_series(range, &token)).await;
                shared.apply_series(generation, range, result);
            });
        }
    }

    fn apply_latest(
        self: &Arc<Self>,
        generation: u64,
        result: Result<Option<LatestSnapshot>, FetchError>,
    ) {
        let mut state = self.lock();
        if !state.latest.is_current(generation) {
            tracing::debug!(generation, "discarding superseded latest response");
            return;
        }
        match result {
            Ok(snapshot) => {
                if snapshot.is_none() {
                    tracing::debug!("service reports no latest measurement");
                }
                self.store.write(|store| store.set_latest(snapshot));
                self.succeed(&mut state, Role::Latest);
            }
            Err(err) => self.fail(&mut state, Role::Latest, err),
        }
    }

    fn apply_series(
        self: &Arc<Self>,
        generation: u64,
        range: TimeRange,
        result: Result<Vec<Measurement>, FetchError>,
    ) {
        let mut state = self.lock();
        if !state.series.is_current(generation) {
            tracing::debug!(generation, %range, "discarding superseded series response");
            return;
        }
        match result {
            Ok(points) => {
                let (series, dropped) = TimeSeries::normalized(range, points);
                if dropped > 0 {
                    tracing::warn!(%range, dropped, "series contained duplicate timestamps");
                }
                tracing::debug!(%range, points = series.len(), "series updated");
                self.store.write(|store| store.set_series(range, series));
                self.succeed(&mut state, Role::Series);
            }
            Err(err) => self.fail(&mut state, Role::Series, err),
        }
    }

    fn succeed(&self, state: &mut ControllerState, role: Role) {
        let slot = state.slot(role);
        slot.finish(FetchPhase::Succeeded);
        slot.loaded = true;
        slot.error = None;
    }

    fn fail(self: &Arc<Self>, state: &mut ControllerState, role: Role, err: FetchError) {
        if err.is_cancelled() {
            state.slot(role).finish(FetchPhase::Cancelled);
            return;
        }

        tracing::warn!(error = %err, "failed to load {}", role);
        state.failures += 1;
        let sequence = state.failures;
        let slot = state.slot(role);
        slot.finish(FetchPhase::Failed);
        slot.error = Some((sequence, format!("Error loading {}: {}", role, err)));
        let first_load = !slot.loaded;

        if first_load {
            self.schedule_retry(state);
        }
    }
}
