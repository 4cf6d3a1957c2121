//! Модуль конфигурации библиотеки newscast-tts
//!
//! Этот модуль содержит структуры и перечисления для настройки библиотеки:
//! "био"-настройки очеловечивания речи, каталог персон и голосов,
//! параметры провайдера и конвейера.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NewscastError, Result};
use crate::media::audio::AudioFormat;
use crate::subtitle::timeline::TimelineOptions;
use crate::tts::retry::RetryPolicy;

/// Допустимые границы числа попыток синтеза одного фрагмента
pub const MIN_ATTEMPTS: u32 = 5;
pub const MAX_ATTEMPTS: u32 = 10;

/// Интенсивность дыхания, передаваемая провайдеру как указание к исполнению
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BreathIntensity {
    /// Мягкое дыхание
    #[default]
    Soft,
    /// Заметное дыхание
    Loud,
    /// Без дыхания
    None,
}

impl BreathIntensity {
    /// Получить строковое представление
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Loud => "loud",
            Self::None => "none",
        }
    }
}

/// Режим паузы между предложениями
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaitDuration {
    /// Естественная пауза (400 мс)
    #[default]
    Natural,
    /// Длинная пауза диктора новостей (1000 мс)
    Long,
    /// Случайная пауза 200..1000 мс
    Random,
}

/// Настройки очеловечивания речи
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BioSettings {
    /// Вероятность заикания, %
    pub stutter_rate: f64,
    /// Интенсивность дыхания
    pub breath_intensity: BreathIntensity,
    /// Плотность слов-паразитов, %
    pub filler_rate: f64,
    /// Разброс громкости, %
    pub volume_variation: f64,
    /// Разброс темпа, %
    pub speed_variation: f64,
    /// Неравномерная подача
    pub asymmetry: bool,
    /// Фоновая атмосфера студии
    pub ambient_sounds: bool,
    /// Режим пауз между предложениями
    pub wait_duration: WaitDuration,
}

impl Default for BioSettings {
    fn default() -> Self {
        Self {
            stutter_rate: 15.0,
            breath_intensity: BreathIntensity::Soft,
            filler_rate: 10.0,
            volume_variation: 20.0,
            speed_variation: 15.0,
            asymmetry: true,
            ambient_sounds: false,
            wait_duration: WaitDuration::Natural,
        }
    }
}

impl BioSettings {
    /// Загрузить настройки из JSON файла
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Голос провайдера синтеза
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Voice {
    /// Голос Kore
    Kore,
    /// Голос Zephyr
    Zephyr,
}

impl Voice {
    /// Получить идентификатор голоса у провайдера
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kore => "Kore",
            Self::Zephyr => "Zephyr",
        }
    }
}

/// Персона диктора
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Persona {
    AnchorAlpha,
    ReporterBeta,
    NarratorGamma,
    HostDelta,
}

impl Persona {
    /// Полный каталог персон
    pub const ALL: [Persona; 4] = [
        Persona::AnchorAlpha,
        Persona::ReporterBeta,
        Persona::NarratorGamma,
        Persona::HostDelta,
    ];

    /// Голос провайдера для персоны
    pub fn voice(&self) -> Voice {
        match self {
            Self::AnchorAlpha | Self::NarratorGamma => Voice::Kore,
            Self::ReporterBeta | Self::HostDelta => Voice::Zephyr,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AnchorAlpha => "Anchor Alpha",
            Self::ReporterBeta => "Reporter Beta",
            Self::NarratorGamma => "Narrator Gamma",
            Self::HostDelta => "Host Delta",
        }
    }

    pub fn style_hint(&self) -> &'static str {
        match self {
            Self::AnchorAlpha => "Mature, authoritative female anchor.",
            Self::ReporterBeta => "Youthful, energetic reporter.",
            Self::NarratorGamma => "Soft, calm narrator.",
            Self::HostDelta => "Warm morning show host.",
        }
    }

    /// Базовый темп речи, вокруг которого колеблется темп предложений
    pub fn base_rate(&self) -> f64 {
        match self {
            Self::AnchorAlpha => 1.05,
            Self::ReporterBeta => 1.10,
            Self::NarratorGamma => 0.98,
            Self::HostDelta => 1.03,
        }
    }
}

/// Параметры провайдера Gemini
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Базовый URL API
    pub base_url: String,
    /// Модель синтеза речи
    pub model: String,
    /// Таймаут одного запроса, секунды
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash-preview-tts".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Параметры очеловечивания
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizerConfig {
    /// Делитель вероятности заикания (stutter_rate / stutter_divisor)
    pub stutter_divisor: f64,
    /// Делитель вероятности слов-паразитов
    pub filler_divisor: f64,
    /// Максимальное отклонение громкости при volume_variation = 100%, дБ
    pub max_volume_db: f64,
}

impl Default for HumanizerConfig {
    fn default() -> Self {
        Self {
            stutter_divisor: 100.0,
            filler_divisor: 200.0,
            max_volume_db: 6.0,
        }
    }
}

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewscastConfig {
    /// Провайдер синтеза
    pub gemini: GeminiConfig,
    /// Максимальная длина фрагмента в символах
    pub max_chunk_chars: usize,
    /// Политика повторов
    pub retry: RetryPolicy,
    /// Пауза между фрагментами, мс
    pub inter_chunk_delay_ms: u64,
    /// Время охлаждения ключа после отказа по квоте, секунды
    pub recovery_interval_secs: u64,
    /// Очеловечивание
    pub humanizer: HumanizerConfig,
    /// Построение субтитров
    pub timeline: TimelineOptions,
    /// Формат PCM потока провайдера
    pub audio: AudioFormat,
}

impl Default for NewscastConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            max_chunk_chars: 300,
            retry: RetryPolicy::default(),
            inter_chunk_delay_ms: 1200,
            recovery_interval_secs: 60,
            humanizer: HumanizerConfig::default(),
            timeline: TimelineOptions::default(),
            audio: AudioFormat::default(),
        }
    }
}

impl NewscastConfig {
    /// Загрузить конфигурацию из JSON файла; отсутствующие поля берутся по умолчанию
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: NewscastConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить конфигурацию
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            return Err(NewscastError::Configuration(
                "max_chunk_chars must be greater than zero".to_string(),
            ));
        }
        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&self.retry.max_attempts) {
            return Err(NewscastError::Configuration(format!(
                "retry.max_attempts must be within {}..={}, got {}",
                MIN_ATTEMPTS,
                MAX_ATTEMPTS,
                self.retry.max_attempts
            )));
        }
        if self.audio.bytes_per_second() == 0 {
            return Err(NewscastError::Configuration(
                "audio format must have a non-zero byte rate".to_string(),
            ));
        }
        if self.humanizer.stutter_divisor <= 0.0 || self.humanizer.filler_divisor <= 0.0 {
            return Err(NewscastError::Configuration(
                "humanizer divisors must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bio_settings_camel_case() {
        let json = r#"{
            "stutterRate": 30,
            "breathIntensity": "loud",
            "fillerRate": 5,
            "volumeVariation": 40,
            "speedVariation": 10,
            "asymmetry": false,
            "ambientSounds": true,
            "waitDuration": "random"
        }"#;
        let settings: BioSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.stutter_rate, 30.0);
        assert_eq!(settings.breath_intensity, BreathIntensity::Loud);
        assert!(settings.ambient_sounds);
        assert_eq!(settings.wait_duration, WaitDuration::Random);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: NewscastConfig = serde_json::from_str(r#"{"max_chunk_chars": 120}"#).unwrap();
        assert_eq!(config.max_chunk_chars, 120);
        assert_eq!(config.inter_chunk_delay_ms, 1200);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_attempts() {
        let mut config = NewscastConfig::default();
        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(NewscastError::Configuration(_))));
        config.retry.max_attempts = 4;
        assert!(config.validate().is_err());
        config.retry.max_attempts = 11;
        assert!(config.validate().is_err());
        config.retry.max_attempts = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_persona_catalog() {
        assert_eq!(Persona::AnchorAlpha.voice().as_str(), "Kore");
        assert_eq!(Persona::HostDelta.voice(), Voice::Zephyr);
        for persona in Persona::ALL {
            assert!(persona.base_rate() > 0.5 && persona.base_rate() < 2.0);
            assert!(!persona.style_hint().is_empty());
        }
    }
}
