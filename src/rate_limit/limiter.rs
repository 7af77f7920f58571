use crate::config::RateLimitConfig;
use crate::errors::Result;
use crate::observability::MetricsRecorder;
use crate::rate_limit::sliding_window::{LimiterConfig, RateLimitDecision, SlidingWindowRateLimiter};
use tokio_util::sync::CancellationToken;

/// Which route group a check is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Login and registration
    Auth,
    /// Authenticated API routes
    General,
}

impl LimitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Auth => "auth",
            LimitKind::General => "general",
        }
    }
}

/// The limiters shared by every request handler
#[derive(Clone)]
pub struct RateLimiters {
    auth: SlidingWindowRateLimiter,
    general: SlidingWindowRateLimiter,
}

impl RateLimiters {
    /// Build both limiters; their reapers stop when `shutdown` is cancelled
    pub fn new(config: &RateLimitConfig, shutdown: &CancellationToken) -> Result<Self> {
        let auth = SlidingWindowRateLimiter::new(LimiterConfig::from(config.auth), shutdown)?;
        let general = SlidingWindowRateLimiter::new(LimiterConfig::from(config.general), shutdown)?;

        let limiters = Self { auth, general };
        for kind in [LimitKind::Auth, LimitKind::General] {
            let applied = limiters.limiter(kind).config();
            tracing::info!(
                limiter = kind.as_str(),
                requests = applied.rate,
                window_secs = applied.window.as_secs(),
                cleanup_secs = applied.cleanup.as_secs(),
                "Rate limiter initialized"
            );
        }

        Ok(limiters)
    }

    pub fn limiter(&self, kind: LimitKind) -> &SlidingWindowRateLimiter {
        match kind {
            LimitKind::Auth => &self.auth,
            LimitKind::General => &self.general,
        }
    }

    /// Run an admission check and record its outcome
    pub fn check(&self, kind: LimitKind, identifier: &str) -> RateLimitDecision {
        let decision = self.limiter(kind).check(identifier);

        tracing::debug!(
            limiter = kind.as_str(),
            identifier = %identifier,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "Rate limit check result"
        );
        MetricsRecorder::record_rate_limit_decision(kind.as_str(), decision.allowed);

        decision
    }

    /// Publish the current registry sizes to the metrics registry
    pub fn report_visitors(&self) {
        for kind in [LimitKind::Auth, LimitKind::General] {
            MetricsRecorder::set_rate_limit_visitors(
                kind.as_str(),
                self.limiter(kind).visitor_count(),
            );
        }
    }
}
