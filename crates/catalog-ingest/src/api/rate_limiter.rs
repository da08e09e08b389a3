//! Client-side rate limiter.
//!
//! Enforces both a minimum spacing between requests (per-second limit) and
//! a sliding one-minute window (per-minute limit).

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter with dual constraints (per-second and per-minute)
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum gap between two requests
    min_interval: Duration,
    /// Maximum requests per minute
    max_per_minute: usize,
    /// Last request timestamp
    last_request: Option<Instant>,
    /// Request timestamps inside the current window, oldest first
    recent_requests: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter. Non-positive rates disable that limit.
    pub fn new(max_per_second: f64, max_per_minute: u32) -> Self {
        let min_interval = if max_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / max_per_second)
        } else {
            Duration::ZERO
        };
        let max_per_minute = if max_per_minute == 0 {
            usize::MAX
        } else {
            max_per_minute as usize
        };

        Self {
            min_interval,
            max_per_minute,
            last_request: None,
            recent_requests: VecDeque::new(),
        }
    }

    /// Wait until a request can be made, respecting both rate limits
    pub async fn acquire(&mut self) {
        self.evict_expired(Instant::now());

        if self.recent_requests.len() >= self.max_per_minute {
            if let Some(&oldest) = self.recent_requests.front() {
                let wait_time = WINDOW.saturating_sub(oldest.elapsed());
                if !wait_time.is_zero() {
                    tracing::debug!(
                        wait_ms = wait_time.as_millis() as u64,
                        "Rate limit: waiting for per-minute limit"
                    );
                    sleep(wait_time).await;
                }
            }
            self.evict_expired(Instant::now());
        }

        if let Some(last) = self.last_request {
            let wait_time = self.min_interval.saturating_sub(last.elapsed());
            if !wait_time.is_zero() {
                tracing::debug!(
                    wait_ms = wait_time.as_millis() as u64,
                    "Rate limit: waiting for per-second limit"
                );
                sleep(wait_time).await;
            }
        }

        let request_time = Instant::now();
        self.last_request = Some(request_time);
        self.recent_requests.push_back(request_time);
    }

    /// Get the current number of requests in the last minute
    pub fn current_minute_count(&mut self) -> usize {
        self.evict_expired(Instant::now());
        self.recent_requests.len()
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(&oldest) = self.recent_requests.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.recent_requests.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_per_second() {
        let mut limiter = RateLimiter::new(10.0, 50);

        let start = Instant::now();

        // 3 requests at 10/s need at least two 100ms gaps
        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_millis(180));
        assert_eq!(limiter.current_minute_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_per_minute() {
        let mut limiter = RateLimiter::new(0.0, 2);

        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }

        // the third request had to wait for the window to roll over
        assert!(start.elapsed() >= Duration::from_secs(59));
    }

    #[tokio::test]
    async fn test_unlimited_does_not_wait() {
        let mut limiter = RateLimiter::new(0.0, 0);
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn test_current_minute_count() {
        let mut limiter = RateLimiter::new(2.0, 50);
        assert_eq!(limiter.current_minute_count(), 0);
    }
}
