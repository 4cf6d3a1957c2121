//! Модуль обработки ошибок библиотеки newscast-tts
//!
//! Ошибки разделены на два уровня: ошибки провайдера синтеза (`SynthesisError`),
//! которые поглощаются циклом повторов, и ошибки запуска (`NewscastError`),
//! которые возвращаются вызывающему коду как есть.

use thiserror::Error;

/// Класс ошибки провайдера, определяющий реакцию цикла повторов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Исчерпана квота или ключ недействителен: ключ уходит на охлаждение
    QuotaOrAuth,
    /// Временная ошибка: таймаут, 5xx, обрыв соединения
    Transient,
    /// Ответ без аудио или с неразбираемым телом
    Malformed,
}

/// Ошибки одного вызова синтеза речи
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// Превышен лимит запросов (HTTP 429, RESOURCE_EXHAUSTED)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Ключ отклонен провайдером (HTTP 401/403, API_KEY_INVALID)
    #[error("credential rejected: {0}")]
    AuthInvalid(String),

    /// Временная ошибка сети или сервера
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Провайдер не вернул пригодных аудиоданных
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl SynthesisError {
    /// Классифицировать ошибку
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited(_) | Self::AuthInvalid(_) => ErrorKind::QuotaOrAuth,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Malformed(_) => ErrorKind::Malformed,
        }
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SynthesisError::Malformed(e.to_string())
        } else {
            SynthesisError::Transient(e.to_string())
        }
    }
}

/// Ошибки библиотеки newscast-tts
#[derive(Debug, Error)]
pub enum NewscastError {
    /// Пустой входной текст
    #[error("Input text is empty")]
    EmptyInput,

    /// Все попытки синтеза фрагмента исчерпаны
    #[error("Chunk {} failed after {attempts} attempts: {source}", .index + 1)]
    ChunkFailed {
        index: usize,
        attempts: u32,
        #[source]
        source: SynthesisError,
    },

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка кодирования WAV
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    /// Ошибка упаковки архива
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Ошибка хранилища состояния
    #[error("State store error: {0}")]
    Store(String),
}

/// Тип Result для библиотеки newscast-tts
pub type Result<T> = std::result::Result<T, NewscastError>;
