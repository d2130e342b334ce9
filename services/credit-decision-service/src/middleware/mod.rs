pub mod idempotency;
pub mod rate_limit;

pub use idempotency::IdempotencyCache;
pub use rate_limit::RateLimiter;
