// src/common/retry.rs

use std::{fmt::Display, future::Future, time::Duration};

/// Política de novas tentativas com backoff exponencial (1s, 2s, 4s, ...).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Espera aplicada depois da tentativa `attempt` (0-based) falhar.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Erros que sabem dizer se vale a pena tentar de novo.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Erros 4xx são do cliente e não mudam com retry, exceto timeout (408)
/// e rate limit (429).
pub fn status_is_retryable(status: u16) -> bool {
    !(400..500).contains(&status) || status == 408 || status == 429
}

pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!("✅ {} executado com sucesso na tentativa {}", label, attempt + 1);
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() || attempt + 1 >= max_attempts => {
                tracing::error!("💥 {} falha final: {}", label, err);
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "⚠️ {} tentativa {} falhou, retry em {:?}: {}",
                    label,
                    attempt + 1,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    #[derive(Debug)]
    struct FakeError {
        status: u16,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "status {}", self.status)
        }
    }

    impl Retryable for FakeError {
        fn is_retryable(&self) -> bool {
            status_is_retryable(self.status)
        }
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn client_errors_are_not_retried_except_timeout_and_rate_limit() {
        assert!(!status_is_retryable(400));
        assert!(!status_is_retryable(403));
        assert!(!status_is_retryable(404));
        assert!(status_is_retryable(408));
        assert!(status_is_retryable(429));
        assert!(status_is_retryable(500));
        assert!(status_is_retryable(503));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_server_errors_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<&str, FakeError> =
            retry_with_backoff(&RetryPolicy::default(), "remuneracoes-sync", |_| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(FakeError { status: 503 })
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), FakeError> =
            retry_with_backoff(&RetryPolicy::default(), "update-serie", |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(FakeError { status: 500 })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_failures_fail_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), FakeError> =
            retry_with_backoff(&RetryPolicy::default(), "create-user", |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(FakeError { status: 400 })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
