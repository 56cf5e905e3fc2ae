//! Exponential backoff between attempts, bounded by a total time window.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::client::Error;

/// Delay before the n-th retry (starting at 1), before jitter is applied. Grows 1.5 times per
/// retry, starting at one second.
pub fn base_delay(retry: u32) -> Duration {
    let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
    Duration::try_from_secs_f64(1.5_f64.powi(exponent)).unwrap_or(Duration::MAX)
}

/// Scale the delay by `factor`, which is expected to come from [`jitter_factor`].
pub fn jittered(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Random factor from `[0.5, 1.5)`, so clients failing together do not retry together.
pub fn jitter_factor() -> f64 {
    rand::thread_rng().gen_range(0.5..1.5)
}

/// State of the retry loop: when the first attempt started and how many retries were made.
#[derive(Debug)]
pub(crate) struct Backoff {
    first_attempt: Instant,
    timeout: Duration,
    retries: u32,
}

impl Backoff {
    pub fn start(timeout: Duration) -> Self {
        Self {
            first_attempt: Instant::now(),
            timeout,
            retries: 0,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Register that another attempt is needed.
    pub fn retry(&mut self) {
        self.retries += 1;
    }

    /// Block until the next attempt may be made, or fail if the time window is already used up.
    pub fn before_attempt(&self) -> Result<(), Error> {
        let elapsed = self.first_attempt.elapsed();
        if elapsed > self.timeout {
            log::warn!(
                "Giving up after {} retries and {elapsed:?}.",
                self.retries
            );
            return Err(Error::Timeout);
        }

        if self.retries > 0 {
            let delay = jittered(base_delay(self.retries), jitter_factor());
            log::debug!("Waiting {delay:?} before retry {}.", self.retries);
            std::thread::sleep(delay);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_delay_grows_by_half() {
        assert_eq!(base_delay(1), Duration::from_secs(1));
        assert_eq!(base_delay(2), Duration::from_millis(1500));
        assert_eq!(base_delay(3), Duration::from_millis(2250));
        approx::assert_relative_eq!(
            base_delay(8).as_secs_f64(),
            1.5_f64.powi(7),
            max_relative = 1e-9
        );
    }

    #[test]
    fn huge_retry_count_does_not_overflow() {
        assert_eq!(base_delay(u32::MAX), Duration::MAX);
    }

    #[test]
    fn jitter_stays_within_half_of_the_delay() {
        for retry in 1..=6 {
            let base = base_delay(retry);
            for _ in 0..200 {
                let delay = jittered(base, jitter_factor());
                assert!(delay >= base / 2, "{delay:?} too short for {base:?}");
                assert!(delay < base * 3 / 2, "{delay:?} too long for {base:?}");
            }
        }
    }

    #[test]
    fn jittered_bounds() {
        let base = Duration::from_secs(2);
        assert_eq!(jittered(base, 0.5), Duration::from_secs(1));
        assert_eq!(jittered(base, 1.0), base);
    }

    #[test]
    fn first_attempt_is_immediate() {
        let backoff = Backoff::start(Duration::from_secs(60));
        let started = Instant::now();
        backoff.before_attempt().unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn retry_waits_at_least_half_a_second() {
        let mut backoff = Backoff::start(Duration::from_secs(60));
        backoff.retry();

        let started = Instant::now();
        backoff.before_attempt().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(backoff.retries(), 1);
    }

    #[test]
    fn exhausted_window_fails_without_waiting() {
        let mut backoff = Backoff::start(Duration::from_millis(1));
        backoff.retry();
        std::thread::sleep(Duration::from_millis(10));

        let started = Instant::now();
        assert!(matches!(backoff.before_attempt(), Err(Error::Timeout)));
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
