use log::warn;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BASE_DELAY: Duration = Duration::from_millis(100);

/// Runs a store operation, retrying transient failures with exponential
/// backoff (100ms, 200ms) for at most `MAX_ATTEMPTS` attempts.
pub async fn with_backoff<T, E, F, Fut, P>(
    operation: &str,
    is_transient: P,
    mut op: F
) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => {
                return Ok(value);
            }
            Err(e) if attempt + 1 < MAX_ATTEMPTS && is_transient(&e) => {
                let delay = BASE_DELAY * (1u32 << attempt);
                warn!(
                    "store_throttled op={} attempt={} sleep_ms={} error={}",
                    operation,
                    attempt + 1,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e);
            }
        }
    }
}

pub fn is_transient_redis(err: &redis::RedisError) -> bool {
    err.is_timeout() ||
        err.is_connection_dropped() ||
        matches!(err.kind(), redis::ErrorKind::BusyLoadingError | redis::ErrorKind::TryAgain)
}
