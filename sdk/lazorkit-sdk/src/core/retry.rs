//! Bounded retries for RPC calls and confirmation polling.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use backoff::ExponentialBackoff;
use solana_sdk::signature::Signature;

use crate::core::connection::SolConnection;
use crate::error::{LazorSdkError, Result};

/// Longest single wait of an exponential policy.
pub const MAX_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    Fixed(Duration),
    /// Doubles after every failed attempt, up to [`MAX_INTERVAL`].
    Exponential { initial: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub kind: BackoffKind,
}

impl RetryPolicy {
    pub const fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            kind: BackoffKind::Fixed(delay),
        }
    }

    pub const fn exponential(max_retries: u32, initial: Duration) -> Self {
        Self {
            max_retries,
            kind: BackoffKind::Exponential { initial },
        }
    }

    /// A fresh backoff that yields `max_retries` delays and then stops.
    pub fn backoff(&self) -> Bounded<Schedule> {
        let schedule = match self.kind {
            BackoffKind::Fixed(delay) => Schedule::Fixed(Constant::new(delay)),
            BackoffKind::Exponential { initial } => Schedule::Exponential(exponential(initial)),
        };
        Bounded::new(schedule, self.max_retries)
    }
}

/// Unbounded delay sequence behind a [`RetryPolicy`].
#[derive(Debug)]
pub enum Schedule {
    Fixed(Constant),
    Exponential(ExponentialBackoff),
}

impl Backoff for Schedule {
    fn reset(&mut self) {
        match self {
            Schedule::Fixed(inner) => inner.reset(),
            Schedule::Exponential(inner) => inner.reset(),
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        match self {
            Schedule::Fixed(inner) => inner.next_backoff(),
            Schedule::Exponential(inner) => inner.next_backoff(),
        }
    }
}

fn exponential(initial: Duration) -> ExponentialBackoff {
    let mut backoff = ExponentialBackoff::default();
    backoff.initial_interval = initial;
    backoff.current_interval = initial;
    backoff.multiplier = 2.0;
    backoff.randomization_factor = 0.0;
    backoff.max_interval = MAX_INTERVAL;
    backoff.max_elapsed_time = None;
    backoff
}

/// Caps any [`Backoff`] at a number of retries.
#[derive(Debug)]
pub struct Bounded<B> {
    inner: B,
    max_retries: u32,
    remaining: u32,
}

impl<B: Backoff> Bounded<B> {
    pub fn new(inner: B, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            remaining: max_retries,
        }
    }
}

impl<B: Backoff> Backoff for Bounded<B> {
    fn reset(&mut self) {
        self.inner.reset();
        self.remaining = self.max_retries;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.inner.next_backoff()
    }
}

/// Runs `operation` until it succeeds or the retries are spent, returning
/// the last error.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = policy.backoff();
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => match backoff.next_backoff() {
                Some(delay) => {
                    log::warn!("attempt failed: {}; retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                },
                None => {
                    log::error!("giving up after {} retries: {}", policy.max_retries, e);
                    return Err(e);
                },
            },
        }
    }
}

/// Polls the signature status until the transaction lands.
///
/// A landed failure is returned immediately; running out of polls yields
/// [`LazorSdkError::ConfirmationTimeout`].
pub async fn confirm_transaction(
    connection: &impl SolConnection,
    signature: &Signature,
    policy: &RetryPolicy,
) -> Result<()> {
    let mut backoff = policy.backoff();
    loop {
        let status = connection
            .get_signature_status(signature)
            .await
            .map_err(|e| LazorSdkError::Connection(e.to_string()))?;
        match status {
            Some(Ok(())) => {
                log::info!("transaction {} confirmed", signature);
                return Ok(());
            },
            Some(Err(e)) => return Err(LazorSdkError::TransactionFailed(*signature, e)),
            None => match backoff.next_backoff() {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    log::warn!(
                        "transaction {} not confirmed after {} polls",
                        signature,
                        policy.max_retries + 1
                    );
                    return Err(LazorSdkError::ConfirmationTimeout(*signature));
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn delays(policy: &RetryPolicy) -> Vec<Duration> {
        let mut backoff = policy.backoff();
        std::iter::from_fn(|| backoff.next_backoff()).collect()
    }

    fn close_to(actual: Duration, millis: u64) -> bool {
        let expected = Duration::from_millis(millis);
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        diff < Duration::from_micros(10)
    }

    #[test]
    fn test_fixed_backoff_is_bounded() {
        let fixed = delays(&RetryPolicy::fixed(3, Duration::from_millis(10)));
        assert_eq!(fixed, vec![Duration::from_millis(10); 3]);
        assert!(delays(&RetryPolicy::fixed(0, Duration::from_millis(10))).is_empty());
    }

    #[test]
    fn test_exponential_backoff_doubles() {
        let exp = delays(&RetryPolicy::exponential(4, Duration::from_millis(10)));
        assert_eq!(exp.len(), 4);
        for (delay, millis) in exp.iter().zip([10, 20, 40, 80]) {
            assert!(close_to(*delay, millis), "{:?} vs {}ms", delay, millis);
        }

        let capped = delays(&RetryPolicy::exponential(3, MAX_INTERVAL));
        assert!(capped.iter().all(|d| *d <= MAX_INTERVAL + Duration::from_micros(10)));
    }

    #[test]
    fn test_reset_restores_retry_count() {
        let mut backoff = RetryPolicy::fixed(1, Duration::from_millis(1)).backoff();
        assert!(backoff.next_backoff().is_some());
        assert!(backoff.next_backoff().is_none());
        backoff.reset();
        assert!(backoff.next_backoff().is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_retry_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let value = retry(&policy, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LazorSdkError::Connection("busy".into()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_retry_gives_up() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(2, Duration::from_millis(1));
        let result: Result<()> = retry(&policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LazorSdkError::Other("down".into()))
        })
        .await;
        assert!(matches!(result, Err(LazorSdkError::Other(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
