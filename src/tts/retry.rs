//! Политика повторов и комбинатор retry-with-backoff
//!
//! Политика (сколько раз и сколько ждать) отделена от механизма (сам вызов):
//! вызывающий код передает замыкание `attempt -> Future<Result>`, а
//! `retry_with_backoff` решает, когда повторять.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SynthesisError};

/// Политика повторов
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Максимальное количество попыток на фрагмент
    pub max_attempts: u32,
    /// Базовая задержка для временных ошибок, мс
    pub base_delay_ms: u64,
    /// Базовая задержка при отказе по квоте или ключу, мс
    pub rate_limit_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            rate_limit_delay_ms: 3000,
        }
    }
}

impl RetryPolicy {
    /// Политика без задержек
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            rate_limit_delay_ms: 0,
        }
    }

    /// Задержка после неудачной попытки `attempt` (с нуля); растет линейно
    pub fn delay(&self, attempt: u32, kind: ErrorKind) -> Duration {
        let base = match kind {
            ErrorKind::QuotaOrAuth => self.rate_limit_delay_ms,
            ErrorKind::Transient | ErrorKind::Malformed => self.base_delay_ms,
        };
        Duration::from_millis(base.saturating_mul(attempt as u64 + 1))
    }
}

/// Все попытки исчерпаны
#[derive(Debug, Clone)]
pub struct RetryExhausted {
    /// Сколько попыток было сделано
    pub attempts: u32,
    /// Ошибка последней попытки
    pub last_error: SynthesisError,
}

/// Выполнять `operation` до успеха или исчерпания попыток.
///
/// Замыкание получает номер попытки (с нуля). Между попытками выдерживается
/// задержка из политики; после последней попытки задержки нет.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SynthesisError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                log::warn!(
                    "[attempt {}/{}] failed: {}",
                    attempt + 1,
                    max_attempts,
                    error
                );
                if attempt + 1 >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt + 1,
                        last_error: error,
                    });
                }
                let wait = policy.delay(attempt, error.kind());
                if !wait.is_zero() {
                    log::info!("Retrying in {} ms", wait.as_millis());
                    tokio::time::sleep(wait).await;
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_grows_with_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0, ErrorKind::Transient), Duration::from_millis(1000));
        assert_eq!(policy.delay(2, ErrorKind::Malformed), Duration::from_millis(3000));
        assert_eq!(policy.delay(0, ErrorKind::QuotaOrAuth), Duration::from_millis(3000));
        assert_eq!(policy.delay(1, ErrorKind::QuotaOrAuth), Duration::from_millis(6000));
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&RetryPolicy::immediate(5), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(SynthesisError::Transient("timeout".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let result: Result<(), _> = retry_with_backoff(&RetryPolicy::immediate(3), |attempt| async move {
            Err(SynthesisError::Malformed(format!("empty #{}", attempt)))
        })
        .await;
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert!(matches!(exhausted.last_error, SynthesisError::Malformed(ref m) if m == "empty #2"));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = tokio_test::block_on(retry_with_backoff(&RetryPolicy::immediate(0), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SynthesisError::Transient("down".into())) }
        }));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
