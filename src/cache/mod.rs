//! Process-local rate limiting and result memoization.
//!
//! Both maps are best effort: they live as long as the process and nothing
//! depends on them surviving a restart.

mod fingerprint;
mod rate_limit;
mod store;

pub use fingerprint::fingerprint;
pub use rate_limit::{RateDecision, RateLimiter};
pub use store::TtlCache;
