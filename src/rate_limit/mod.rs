pub mod limiter;
pub mod middleware;
pub mod sliding_window;

pub use limiter::{LimitKind, RateLimiters};
pub use middleware::{auth_rate_limit_middleware, rate_limit_middleware};
pub use sliding_window::{
    LimiterConfig, LimiterConfigError, RateLimitDecision, SlidingWindowRateLimiter,
};
