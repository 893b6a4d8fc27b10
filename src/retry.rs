use std::fmt::Display;
use std::time::Duration;

/// Linear backoff: the n-th failed attempt waits n seconds.
pub fn linear_backoff(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt))
}

pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Retry {
    pub max_attempts: u32,
    pub backoff: fn(u32) -> Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: linear_backoff,
        }
    }
}

/// The last failure seen once every attempt has been used.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

impl<E: Display> Display for Exhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gave up after {} attempt(s): {}", self.attempts, self.last)
    }
}

impl Retry {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Run `op` until it succeeds or the attempt bound is reached. `op`
    /// receives the 1-based attempt number. No delay follows the last attempt.
    pub fn run<T, E, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, Exhausted<E>>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last: err,
                    })
                }
                Err(err) => {
                    let delay = (self.backoff)(attempt);
                    tracing::warn!(attempt, max, ?delay, "query attempt failed: {err}");
                    sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
