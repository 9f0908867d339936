use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Instant,
};

use tracing::{field::Field, field::Visit, Event, Level, Metadata, Subscriber};
use tracing_subscriber::{filter::LevelFilter, layer::Context, Layer};

use super::profile::SamplingPolicy;

// Expired windows are pruned once this many keys are tracked.
const MAX_TRACKED_KEYS: usize = 4096;

/// Provides the current instant.
pub trait Clock: Send + Sync {
    /// Report the current instant.
    fn now(&self) -> Instant;
}

/// Provides the current instant using the monotonic system clock.
pub struct MonotonicClock;
impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Window {
    start: Instant,
    count: u64,
}

/// Counts identical records and decides which of them are emitted.
///
/// Records are identical when they share level and message. Each key owns a window
/// that opens with its first record and lasts `policy.tick`; the first `policy.first`
/// records of a window are emitted and the rest are dropped.
pub struct Sampler {
    policy: SamplingPolicy,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<(Level, String), Window>>,
}

impl Sampler {
    /// Create a sampler with the given policy and clock.
    pub fn new(policy: SamplingPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one occurrence and report whether it should be emitted.
    pub fn sample(&self, level: Level, message: &str) -> bool {
        let now = self.clock.now();
        // Counting and window reset happen under the same lock.
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let key = (level, message.to_owned());
        if windows.len() >= MAX_TRACKED_KEYS && !windows.contains_key(&key) {
            let tick = self.policy.tick;
            windows.retain(|_, window| now.duration_since(window.start) < tick);
        }

        let window = windows.entry(key).or_insert(Window {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= self.policy.tick {
            *window = Window {
                start: now,
                count: 0,
            };
        }
        window.count += 1;
        window.count <= self.policy.first
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

struct GateState {
    level: LevelFilter,
    sampler: Option<Sampler>,
}

/// Global filter of a profile: the minimum level and, optionally, sampling.
///
/// Clones share state, so the installed layer can be reconfigured through any clone.
#[derive(Clone)]
pub struct ProfileGate(Arc<RwLock<GateState>>);

impl ProfileGate {
    pub(crate) fn new(level: LevelFilter, sampler: Option<Sampler>) -> Self {
        Self(Arc::new(RwLock::new(GateState { level, sampler })))
    }

    /// Replace level and sampler. Callers rebuild the callsite interest cache afterwards.
    pub(crate) fn set(&self, level: LevelFilter, sampler: Option<Sampler>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = GateState { level, sampler };
    }

    fn level(&self) -> LevelFilter {
        self.0.read().unwrap_or_else(PoisonError::into_inner).level
    }
}

impl<S: Subscriber> Layer<S> for ProfileGate {
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.level() >= *metadata.level()
    }

    fn event_enabled(&self, event: &Event<'_>, _ctx: Context<'_, S>) -> bool {
        let state = self.0.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sampler) = &state.sampler else {
            return true;
        };
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        sampler.sample(*event.metadata().level(), &visitor.message)
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(self.level())
    }
}
