//! # Backoff policy for connection and send retries.
//!
//! [`BackoffPolicy`] controls how retry delays grow after repeated failures.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the delay after the first failure;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay after failure `n` (0-indexed) is `first × factor^n`, clamped to
//! `max`. The schedule is deterministic — no jitter: a bus instance retries a
//! single connection, so there is no herd to de-synchronize, and the
//! predictable schedule keeps outage behavior easy to reason about and test.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use busbar::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! // After the first failed attempt: 2s
//! assert_eq!(backoff.next(0), Duration::from_secs(2));
//! // After the second: 4s, then 8s, 16s, ...
//! assert_eq!(backoff.next(1), Duration::from_secs(4));
//! // ... capped at max (60s by default).
//! assert_eq!(backoff.next(10), Duration::from_secs(60));
//! ```

use std::time::Duration;

/// Retry backoff policy.
///
/// Encapsulates the parameters that determine how retry delays grow:
/// - [`BackoffPolicy::first`] — delay after the first failure;
/// - [`BackoffPolicy::factor`] — multiplicative growth factor;
/// - [`BackoffPolicy::max`] — the maximum delay cap.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
}

impl Default for BackoffPolicy {
    /// Returns the powers-of-two schedule:
    /// - `first = 2s`;
    /// - `factor = 2.0`;
    /// - `max = 60s`.
    ///
    /// Failure `k` (1-indexed) is followed by a `2^k`-second delay.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(2),
            max: Duration::from_secs(60),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay after the given failure number (0-indexed).
    ///
    /// The delay is `first × factor^failure`, clamped to [`BackoffPolicy::max`].
    /// Each failure derives its delay independently; nothing feeds back into
    /// subsequent calculations.
    ///
    /// # Notes
    /// - If `factor` equals 1.0, the delay stays constant at `first` (up to `max`).
    /// - Overflowing or non-finite intermediate values clamp to `max`.
    pub fn next(&self, failure: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = failure.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_schedule_is_powers_of_two() {
        let policy = BackoffPolicy::default();
        // Failure k (1-indexed) maps to next(k - 1) = 2^k seconds.
        assert_eq!(policy.next(0), Duration::from_secs(2));
        assert_eq!(policy.next(1), Duration::from_secs(4));
        assert_eq!(policy.next(2), Duration::from_secs(8));
        assert_eq!(policy.next(3), Duration::from_secs(16));
    }

    #[test]
    fn test_constant_factor() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 1.0,
        };
        for failure in 0..10 {
            assert_eq!(
                policy.next(failure),
                Duration::from_millis(500),
                "failure {} should be constant at 500ms",
                failure
            );
        }
    }

    #[test]
    fn test_clamped_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
        };
        assert_eq!(policy.next(10), Duration::from_secs(1));
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn test_huge_failure_count_clamps_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 2.0,
        };
        assert_eq!(policy.next(100), Duration::from_secs(60));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(60));
    }
}
