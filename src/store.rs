//! Модуль постоянного хранилища состояния
//!
//! Простое key/value хранилище поверх JSON файла. В нем живет идентификатор
//! последнего использованного ключа API, чтобы ротация продолжалась после
//! перезапуска.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{NewscastError, Result};

/// Ключ хранилища с идентификатором последнего использованного ключа API
pub const LAST_CREDENTIAL_KEY: &str = "last_credential_id";

/// Хранилище строковых значений
pub trait StateStore: Send + Sync {
    /// Прочитать значение
    fn get(&self, key: &str) -> Option<String>;

    /// Записать значение
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Хранилище в памяти процесса
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Хранилище в JSON файле (объект верхнего уровня)
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<serde_json::Map<String, Value>>,
}

impl JsonFileStore {
    /// Открыть хранилище; отсутствующий файл означает пустое хранилище
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                serde_json::Map::new()
            } else {
                match serde_json::from_str::<Value>(&raw)? {
                    Value::Object(map) => map,
                    _ => {
                        return Err(NewscastError::Store(format!(
                            "{} does not contain a JSON object",
                            path.display()
                        )))
                    }
                }
            }
        } else {
            serde_json::Map::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Путь к файлу хранилища
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &serde_json::Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Пишем во временный файл и переименовываем, чтобы не оставить обрезанный JSON
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&values)
    }
}
