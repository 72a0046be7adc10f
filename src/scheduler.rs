use crate::settings::{clamp_cps, Settings, MAX_JITTER};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::{Duration, Instant};

/// No delay ever goes below this, whatever the rate and jitter.
pub const MIN_DELAY_MS: u64 = 10;

// -------------- Delay math --------------
pub fn base_delay_ms(cps: f64) -> u64 {
    let cps = clamp_cps(cps);
    ((1000.0 / cps).round() as u64).max(MIN_DELAY_MS)
}

/// `draw` is a uniform sample in `[-1, 1]`; out of range values are clamped.
pub fn jittered_delay_ms(base_ms: u64, jitter: u32, draw: f64) -> u64 {
    let spread = base_ms as f64 * (jitter.min(MAX_JITTER) as f64 / 100.0);
    let delay = base_ms as f64 + draw.clamp(-1.0, 1.0) * spread;
    (delay.round() as i64).max(MIN_DELAY_MS as i64) as u64
}

pub fn next_delay<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Duration {
    let draw = rng.gen_range(-1.0..=1.0);
    Duration::from_millis(jittered_delay_ms(base_delay_ms(settings.cps), settings.jitter, draw))
}

// -------------- Clock --------------
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant { Instant::now() }
}

/// A clock that only moves when told to.
pub struct ManualClock { now: Mutex<Instant> }

impl ManualClock {
    pub fn new() -> Self { Self { now: Mutex::new(Instant::now()) } }
    pub fn advance(&self, by: Duration) { *self.now.lock() += by; }
}

impl Default for ManualClock {
    fn default() -> Self { Self::new() }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant { *self.now.lock() }
}

// -------------- Timer state machine --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Scheduled { due: Instant, delay: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    Idle,
    Pending(Duration),
    Due,
}

/// The single repeating timer behind the click loop.
///
/// A `Due` poll leaves the timer scheduled until [`Scheduler::complete_tick`]
/// re-arms it, so a `stop` issued while the tick is being dispatched cancels
/// the next one.
pub struct Scheduler<R = StdRng> {
    state: TimerState,
    rng: R,
    armed: u64,
}

impl Scheduler<StdRng> {
    pub fn new() -> Self { Self::with_rng(StdRng::from_entropy()) }
}

impl Default for Scheduler<StdRng> {
    fn default() -> Self { Self::new() }
}

impl<R: Rng> Scheduler<R> {
    pub fn with_rng(rng: R) -> Self { Self { state: TimerState::Idle, rng, armed: 0 } }

    pub fn state(&self) -> TimerState { self.state }

    pub fn is_running(&self) -> bool { matches!(self.state, TimerState::Scheduled { .. }) }

    /// How many times a timer has been armed since creation.
    pub fn armed_count(&self) -> u64 { self.armed }

    fn arm(&mut self, now: Instant, settings: &Settings) {
        let delay = next_delay(settings, &mut self.rng);
        self.state = TimerState::Scheduled { due: now + delay, delay };
        self.armed += 1;
    }

    /// Returns `false` when already running.
    pub fn start(&mut self, now: Instant, settings: &Settings) -> bool {
        if self.is_running() { return false; }
        self.arm(now, settings);
        true
    }

    /// Returns `false` when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() { return false; }
        self.state = TimerState::Idle;
        true
    }

    /// Re-arms with a fresh delay if running; a stopped scheduler stays stopped.
    pub fn reschedule(&mut self, now: Instant, settings: &Settings) {
        if self.stop() { self.start(now, settings); }
    }

    pub fn poll(&self, now: Instant) -> Poll {
        match self.state {
            TimerState::Idle => Poll::Idle,
            TimerState::Scheduled { due, .. } if now >= due => Poll::Due,
            TimerState::Scheduled { due, .. } => Poll::Pending(due - now),
        }
    }

    /// Re-arms relative to `now` after a due tick was handled.
    pub fn complete_tick(&mut self, now: Instant, settings: &Settings) {
        if self.is_running() { self.arm(now, settings); }
    }
}
