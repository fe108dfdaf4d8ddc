use crate::domain::CheckSelection;
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Requests per minute the Uptime.com API accepts.
pub const DEFAULT_RATE_LIMIT: u64 = 60;
/// Gap inserted before each call when throttling with a fixed delay.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1050);

/// The notice printed at the start of every run.
pub fn rate_limit_warning(limit_per_minute: u64) -> String {
    format!(
        "Uptime API has a rate limit of {limit} calls per minute. \
If more than {limit} calls are required, a delay will be placed in an attempt to comply with this limit.",
        limit = limit_per_minute
    )
}

/// Up-front guess at how many API calls a run will make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallBudget {
    Estimated(u64),
    /// Fetching every check: the count depends on the account.
    Unbounded,
}

impl CallBudget {
    /// One name lookup per check plus one stats call per day per check.
    pub fn estimate(selection: &CheckSelection, window_days: u32) -> Self {
        match selection {
            CheckSelection::All => Self::Unbounded,
            CheckSelection::Explicit(keys) => {
                let checks = keys.len() as u64;
                let days = u64::from(window_days) + 1;
                Self::Estimated(checks.saturating_add(checks.saturating_mul(days)))
            }
        }
    }
}

impl fmt::Display for CallBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimated(calls) => write!(f, "{}", calls),
            Self::Unbounded => f.write_str("unknown (all checks)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    On,
    Off,
}

impl Throttle {
    pub fn decide(budget: CallBudget, rate_limit: u64) -> Self {
        match budget {
            CallBudget::Unbounded => Self::On,
            CallBudget::Estimated(calls) if calls > rate_limit => Self::On,
            CallBudget::Estimated(_) => Self::Off,
        }
    }
}

/// Source of time for the pacers, so tests need not sleep for real.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Invoked immediately before every API call of a run.
pub trait Pacer {
    fn pace(&mut self);
}

impl<P: Pacer + ?Sized> Pacer for &mut P {
    fn pace(&mut self) {
        (**self).pace()
    }
}

impl<P: Pacer + ?Sized> Pacer for Box<P> {
    fn pace(&mut self) {
        (**self).pace()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pace(&mut self) {}
}

/// Sleeps the same amount before every call, regardless of how long the
/// previous call took.
pub struct FixedDelay<C: Clock = SystemClock> {
    delay: Duration,
    clock: C,
}

impl<C: Clock> FixedDelay<C> {
    pub fn new(delay: Duration, clock: C) -> Self {
        Self { delay, clock }
    }
}

impl<C: Clock> Pacer for FixedDelay<C> {
    fn pace(&mut self) {
        self.clock.sleep(self.delay);
    }
}

/// Refills `rate_per_minute / 60` tokens per second up to `burst`, and
/// sleeps only for the shortfall when a call finds the bucket empty.
pub struct TokenBucket<C: Clock = SystemClock> {
    per_second: f64,
    burst: f64,
    tokens: f64,
    last_refill: Option<Instant>,
    clock: C,
}

impl<C: Clock> TokenBucket<C> {
    pub fn new(rate_per_minute: u64, burst: u32, clock: C) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            per_second: rate_per_minute.max(1) as f64 / 60.0,
            burst,
            tokens: burst,
            last_refill: None,
            clock,
        }
    }
}

impl<C: Clock> Pacer for TokenBucket<C> {
    fn pace(&mut self) {
        let now = self.clock.now();
        if let Some(last) = self.last_refill {
            let earned = now.saturating_duration_since(last).as_secs_f64() * self.per_second;
            self.tokens = (self.tokens + earned).min(self.burst);
        }
        self.last_refill = Some(now);

        if self.tokens < 1.0 {
            let wait = Duration::from_secs_f64((1.0 - self.tokens) / self.per_second);
            self.clock.sleep(wait);
            self.tokens = 1.0;
            self.last_refill = Some(now + wait);
        }
        self.tokens -= 1.0;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacingStrategy {
    #[default]
    Fixed,
    TokenBucket,
}

impl FromStr for PacingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fixed" => Ok(Self::Fixed),
            "token-bucket" | "token_bucket" => Ok(Self::TokenBucket),
            other => Err(format!(
                "Unknown pacing '{}'; expected fixed or token-bucket",
                other
            )),
        }
    }
}
