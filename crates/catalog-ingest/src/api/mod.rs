//! Upstream catalog API access.
//!
//! A rate-limited, retry-enabled client for the Jikan v4 REST API
//! (the unofficial MyAnimeList API) and its wire types.

pub mod client;
pub mod rate_limiter;
pub mod types;

pub use client::FetchClient;
pub use rate_limiter::RateLimiter;
pub use types::*;
