//! In-memory sliding window rate limiter.
//!
//! Each identity key owns a visitor record holding the timestamps of its
//! admitted requests inside the trailing window. Locking is two-level:
//! the registry is a sharded [`DashMap`] whose shard locks are only held to
//! look up, insert or remove records, while each record carries its own
//! mutex held across the whole prune/decide/append step of a check.
//!
//! A background reaper evicts visitors that have not been seen for longer
//! than the cleanup interval. Its lifetime is tied to a
//! [`CancellationToken`] and to the limiter itself.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Rejected limiter settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterConfigError {
    #[error("rate limit must allow at least one request per window")]
    ZeroRate,
    #[error("rate limit window must be longer than zero")]
    ZeroWindow,
    #[error("rate limit cleanup interval must be longer than zero")]
    ZeroCleanup,
    #[error("rate limit cleanup interval ({cleanup:?}) must not be shorter than the window ({window:?})")]
    CleanupShorterThanWindow { cleanup: Duration, window: Duration },
}

/// Immutable settings of one limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    /// Maximum admitted requests per window
    pub rate: u32,
    /// Length of the trailing window
    pub window: Duration,
    /// Reaper period, and how long a visitor may stay unseen before eviction
    pub cleanup: Duration,
}

impl LimiterConfig {
    pub fn new(rate: u32, window: Duration, cleanup: Duration) -> Self {
        Self {
            rate,
            window,
            cleanup,
        }
    }

    /// A cleanup shorter than the window would evict visitors that still
    /// hold unexpired timestamps and hand them a fresh quota early.
    pub fn validate(&self) -> Result<(), LimiterConfigError> {
        if self.rate == 0 {
            return Err(LimiterConfigError::ZeroRate);
        }
        if self.window.is_zero() {
            return Err(LimiterConfigError::ZeroWindow);
        }
        if self.cleanup.is_zero() {
            return Err(LimiterConfigError::ZeroCleanup);
        }
        if self.cleanup < self.window {
            return Err(LimiterConfigError::CleanupShorterThanWindow {
                cleanup: self.cleanup,
                window: self.window,
            });
        }
        Ok(())
    }
}

impl From<crate::config::WindowLimitConfig> for LimiterConfig {
    fn from(config: crate::config::WindowLimitConfig) -> Self {
        Self::new(config.requests, config.window(), config.cleanup())
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// The configured maximum per window
    pub limit: u32,
    /// Requests still available in the current window
    pub remaining: u32,
    /// Time until the oldest counted request leaves the window.
    /// Zero for admitted requests.
    pub reset_in: Duration,
}

impl RateLimitDecision {
    /// Whole seconds a denied caller should wait, rounded up so that a
    /// retry at that point is guaranteed to find a free slot.
    pub fn retry_after(&self) -> Option<u64> {
        if self.allowed {
            return None;
        }
        let secs = self.reset_in.as_secs();
        if self.reset_in.subsec_nanos() > 0 {
            Some(secs + 1)
        } else {
            Some(secs)
        }
    }
}

#[derive(Debug)]
struct Visitor {
    timestamps: VecDeque<Instant>,
    last_seen: Instant,
    /// Set by the reaper when it unlinks the record from the registry
    evicted: bool,
}

impl Visitor {
    fn new(now: Instant) -> Self {
        Self {
            timestamps: VecDeque::new(),
            last_seen: now,
            evicted: false,
        }
    }

    fn admit(&mut self, config: &LimiterConfig, now: Instant) -> RateLimitDecision {
        if let Some(cutoff) = now.checked_sub(config.window) {
            while self.timestamps.front().is_some_and(|&ts| ts <= cutoff) {
                self.timestamps.pop_front();
            }
        }

        self.last_seen = now;

        if self.timestamps.len() >= config.rate as usize {
            let reset_in = self
                .timestamps
                .front()
                .map(|&oldest| (oldest + config.window).saturating_duration_since(now))
                .unwrap_or_default();

            return RateLimitDecision {
                allowed: false,
                limit: config.rate,
                remaining: self.remaining(config),
                reset_in,
            };
        }

        self.timestamps.push_back(now);

        RateLimitDecision {
            allowed: true,
            limit: config.rate,
            remaining: self.remaining(config),
            reset_in: Duration::ZERO,
        }
    }

    fn remaining(&self, config: &LimiterConfig) -> u32 {
        let used = u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX);
        config.rate.saturating_sub(used)
    }

    fn is_idle(&self, cleanup: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) > cleanup
    }
}

type VisitorRef = Arc<Mutex<Visitor>>;

fn lock(visitor: &VisitorRef) -> MutexGuard<'_, Visitor> {
    // Critical sections never leave a visitor half-updated, so a poisoned
    // lock still guards consistent data.
    visitor.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    config: LimiterConfig,
    visitors: DashMap<String, VisitorRef>,
    shutdown: CancellationToken,
}

impl Shared {
    /// Evict visitors unseen for longer than the cleanup interval.
    ///
    /// A visitor whose lock is currently held by a check is kept and
    /// reconsidered on the next sweep.
    fn purge_idle(&self, now: Instant) -> usize {
        let cleanup = self.config.cleanup;
        let mut removed = 0;

        self.visitors.retain(|_, visitor| {
            let mut guard = match visitor.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return true,
            };

            if guard.is_idle(cleanup, now) {
                guard.evicted = true;
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Per-identity sliding window limiter with a self-cleaning registry.
///
/// Cloning is cheap and every clone shares the same registry. The reaper
/// stops when the shutdown token passed to [`SlidingWindowRateLimiter::new`]
/// is cancelled or when the last clone is dropped.
#[derive(Clone)]
pub struct SlidingWindowRateLimiter {
    shared: Arc<Shared>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter and start its reaper on the current tokio runtime
    pub fn new(
        config: LimiterConfig,
        shutdown: &CancellationToken,
    ) -> Result<Self, LimiterConfigError> {
        config.validate()?;

        let token = shutdown.child_token();
        let shared = Arc::new(Shared {
            config,
            visitors: DashMap::new(),
            shutdown: token.clone(),
        });

        tokio::spawn(reaper(Arc::downgrade(&shared), token, config.cleanup));

        tracing::debug!(
            rate = config.rate,
            window_secs = config.window.as_secs(),
            cleanup_secs = config.cleanup.as_secs(),
            "Sliding window rate limiter started"
        );

        Ok(Self { shared })
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.shared.config
    }

    /// Decide whether `identity` may make a request now.
    ///
    /// Never fails; the empty string is a valid (shared) identity.
    pub fn check(&self, identity: &str) -> RateLimitDecision {
        self.check_with(identity, Instant::now)
    }

    /// Number of identities currently tracked
    pub fn visitor_count(&self) -> usize {
        self.shared.visitors.len()
    }

    /// `clock` is read only once the visitor lock is held, so timestamps
    /// within a record stay in chronological order.
    fn check_with(&self, identity: &str, clock: impl Fn() -> Instant) -> RateLimitDecision {
        loop {
            let visitor = self.visitor(identity, &clock);
            let mut guard = lock(&visitor);

            if guard.evicted {
                // Reaped between lookup and lock; retry against the registry.
                continue;
            }

            return guard.admit(&self.shared.config, clock());
        }
    }

    fn visitor(&self, identity: &str, clock: &impl Fn() -> Instant) -> VisitorRef {
        if let Some(existing) = self.shared.visitors.get(identity) {
            return Arc::clone(existing.value());
        }

        // The entry API holds the shard lock, so concurrent first sightings
        // all end up with the same record.
        let entry = self
            .shared
            .visitors
            .entry(identity.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(Visitor::new(clock()))));
        Arc::clone(entry.value())
    }
}

async fn reaper(shared: Weak<Shared>, shutdown: CancellationToken, cleanup: Duration) {
    let start = tokio::time::Instant::now() + cleanup;
    let mut ticker = tokio::time::interval_at(start, cleanup);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };

                let removed = shared.purge_idle(Instant::now());
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = shared.visitors.len(),
                        "Reaped idle rate limit visitors"
                    );
                }
            }
        }
    }

    tracing::debug!("Rate limiter reaper stopped");
}
