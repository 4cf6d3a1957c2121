//! Модуль ротации ключей API
//!
//! Пул ключей распределяет нагрузку между несколькими учетными данными:
//! ключи, упершиеся в квоту, уходят на охлаждение, а один и тот же ключ не
//! выбирается два раза подряд. Ни один ключ не исключается навсегда.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{NewscastError, Result};
use crate::store::{StateStore, LAST_CREDENTIAL_KEY};

/// Источник текущего времени
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Системные часы
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Часы, которые двигаются только вручную
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Сдвинуть часы вперед
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now = *now + delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Учетные данные провайдера
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Идентификатор ключа (безопасен для логов)
    pub id: String,
    api_key: String,
}

impl Credential {
    pub fn new(id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_key: api_key.into(),
        }
    }

    /// Секретный ключ API
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Построить список из ключей; идентификаторы key-1, key-2, ...
    pub fn from_keys<I, S>(keys: I) -> Vec<Credential>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .enumerate()
            .map(|(i, key)| Credential::new(format!("key-{}", i + 1), key))
            .collect()
    }

    /// Прочитать ключи из переменной окружения (через запятую)
    pub fn from_env_list(var: &str) -> Result<Vec<Credential>> {
        let raw = std::env::var(var).map_err(|_| {
            NewscastError::Configuration(format!("environment variable {} is not set", var))
        })?;
        let credentials = Credential::from_keys(raw.split(','));
        if credentials.is_empty() {
            return Err(NewscastError::Configuration(format!(
                "environment variable {} contains no API keys",
                var
            )));
        }
        Ok(credentials)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("api_key", &"***")
            .finish()
    }
}

/// Состояние здоровья ключа
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Ключ еще не использовался
    Unknown,
    /// Последний вызов прошел успешно или охлаждение закончилось
    Healthy,
    /// Ключ отдыхает после отказа по квоте до указанного момента
    Cooling { until: DateTime<Utc> },
}

struct PoolState {
    statuses: HashMap<String, CredentialStatus>,
    last_used: Option<String>,
    rng: StdRng,
}

/// Пул ключей API с учетом здоровья
pub struct CredentialPool {
    credentials: Vec<Credential>,
    state: Mutex<PoolState>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    recovery_interval: Duration,
}

impl CredentialPool {
    /// Создать пул. Пустой список или повторяющиеся идентификаторы дают ошибку конфигурации.
    pub fn new(
        credentials: Vec<Credential>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
        recovery_interval: Duration,
    ) -> Result<Self> {
        if credentials.is_empty() {
            return Err(NewscastError::Configuration(
                "at least one API credential is required".to_string(),
            ));
        }

        let mut statuses = HashMap::new();
        for credential in &credentials {
            if statuses
                .insert(credential.id.clone(), CredentialStatus::Unknown)
                .is_some()
            {
                return Err(NewscastError::Configuration(format!(
                    "duplicate credential id: {}",
                    credential.id
                )));
            }
        }

        let last_used = store.get(LAST_CREDENTIAL_KEY);

        Ok(Self {
            credentials,
            state: Mutex::new(PoolState {
                statuses,
                last_used,
                rng,
            }),
            store,
            clock,
            recovery_interval,
        })
    }

    /// Количество ключей в пуле
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Текущее состояние ключа
    pub fn status(&self, id: &str) -> Option<CredentialStatus> {
        self.state.lock().statuses.get(id).copied()
    }

    /// Выбрать ключ для следующей попытки
    pub fn select(&self) -> Credential {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let mut available: Vec<&Credential> = Vec::with_capacity(self.credentials.len());
        for credential in &self.credentials {
            let status = state
                .statuses
                .entry(credential.id.clone())
                .or_insert(CredentialStatus::Unknown);
            if let CredentialStatus::Cooling { until } = *status {
                if until > now {
                    continue;
                }
                log::debug!("Credential {} recovered from cooling", credential.id);
                *status = CredentialStatus::Healthy;
            }
            available.push(credential);
        }

        if available.is_empty() {
            log::warn!("All {} credentials are cooling down, resetting the pool", self.credentials.len());
            available = self.credentials.iter().collect();
        }

        if let Some(last) = state.last_used.as_deref() {
            if available.len() > 1 && available.iter().any(|c| c.id == last) {
                available.retain(|c| c.id != last);
            }
        }

        let pick = available[state.rng.gen_range(0..available.len())].clone();
        state.last_used = Some(pick.id.clone());
        drop(state);

        // запись в хранилище нужна только для следующего запуска
        if let Err(e) = self.store.set(LAST_CREDENTIAL_KEY, &pick.id) {
            log::warn!("Failed to persist last used credential {}: {}", pick.id, e);
        }
        log::debug!("Selected credential {}", pick.id);
        pick
    }

    /// Отправить ключ на охлаждение после отказа по квоте или авторизации
    pub fn mark_failed(&self, id: &str) {
        let until = self.clock.now() + self.recovery_interval;
        let mut state = self.state.lock();
        if let Some(status) = state.statuses.get_mut(id) {
            *status = CredentialStatus::Cooling { until };
            log::warn!("Credential {} is cooling down until {}", id, until.to_rfc3339());
        }
    }

    /// Отметить успешный вызов
    pub fn mark_succeeded(&self, id: &str) {
        let mut state = self.state.lock();
        if let Some(status) = state.statuses.get_mut(id) {
            *status = CredentialStatus::Healthy;
        }
    }
}
