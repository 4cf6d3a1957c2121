//! Основной файл библиотеки newscast-tts с поддержкой системы прогресса и уведомлений
//!
//! Библиотека превращает текст новостного выпуска в речь и субтитры:
//! текст режется на фрагменты, каждый фрагмент очеловечивается и
//! синтезируется с ротацией ключей API и повторами, после чего по
//! длительностям фрагментов строится таймлайн субтитров.

pub mod config;
pub mod error;
pub mod logger;
pub mod media;
pub mod notification;
pub mod package;
pub mod progress;
pub mod store;
pub mod subtitle;
pub mod text;
pub mod tts;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{BioSettings, NewscastConfig};
use crate::error::{NewscastError, Result};
use crate::notification::PercentCallbackObserver;
use crate::progress::{
    DefaultProgressReporter, ProcessStep, ProgressObserver, ProgressReporter, ProgressTracker,
};
use crate::store::StateStore;
use crate::subtitle::build_cues;
use crate::text::segment;
use crate::tts::{Credential, CredentialPool, GeminiSynthesizer, Orchestrator, SystemClock, Synthesizer};

pub use crate::package::{PackagePaths, SpeechPackage};
pub use crate::tts::{ChunkMetadata, SpeechResult};

/// Переменная окружения со списком ключей API через запятую
pub const API_KEYS_ENV: &str = "GEMINI_API_KEYS";

/// Параметры одного запроса на генерацию речи
pub struct GenerateSpeechParams {
    /// Текст выпуска
    pub text: String,
    /// Настройки очеловечивания
    pub settings: BioSettings,
    /// Обратный вызов с процентом синтеза (0-100) после каждого фрагмента
    pub on_progress: Option<Box<dyn Fn(u32) + Send + Sync>>,
}

impl GenerateSpeechParams {
    pub fn new(text: impl Into<String>, settings: BioSettings) -> Self {
        Self {
            text: text.into(),
            settings,
            on_progress: None,
        }
    }

    /// Добавить обратный вызов прогресса
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// Основная структура для работы с библиотекой
pub struct NewscastTts {
    config: NewscastConfig,
    orchestrator: Orchestrator,
    progress_tracker: Option<ProgressTracker>,
}

impl NewscastTts {
    /// Создать экземпляр с указанным провайдером и пулом ключей
    pub fn new(
        config: NewscastConfig,
        synthesizer: Arc<dyn Synthesizer>,
        pool: Arc<CredentialPool>,
    ) -> Result<Self> {
        Self::with_rng(config, synthesizer, pool, StdRng::from_entropy())
    }

    /// Создать экземпляр с заданным генератором случайных чисел
    pub fn with_rng(
        config: NewscastConfig,
        synthesizer: Arc<dyn Synthesizer>,
        pool: Arc<CredentialPool>,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let orchestrator = Orchestrator::new(synthesizer, pool, config.clone(), rng);
        Ok(Self {
            config,
            orchestrator,
            progress_tracker: None,
        })
    }

    /// Создать экземпляр с Gemini и ключами из `GEMINI_API_KEYS`
    pub fn from_env(config: NewscastConfig, store: Arc<dyn StateStore>) -> Result<Self> {
        let credentials = Credential::from_env_list(API_KEYS_ENV)?;
        log::info!("Loaded {} API credentials", credentials.len());

        let pool = CredentialPool::new(
            credentials,
            store,
            Arc::new(SystemClock),
            StdRng::from_entropy(),
            chrono::Duration::seconds(config.recovery_interval_secs as i64),
        )?;
        let synthesizer = GeminiSynthesizer::new(config.gemini.clone())?;
        Self::new(config, Arc::new(synthesizer), Arc::new(pool))
    }

    /// Конфигурация экземпляра
    pub fn config(&self) -> &NewscastConfig {
        &self.config
    }

    /// Пул ключей API
    pub fn credential_pool(&self) -> &Arc<CredentialPool> {
        self.orchestrator.pool()
    }

    /// Установить репортер прогресса
    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        match &mut self.progress_tracker {
            Some(tracker) => tracker.set_reporter(reporter),
            None => self.progress_tracker = Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Добавить наблюдателя прогресса
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let tracker = self.progress_tracker.get_or_insert_with(ProgressTracker::new);
        if !tracker.has_reporter() {
            tracker.set_reporter(Box::new(DefaultProgressReporter::new()));
        }
        tracker.add_observer(observer).unwrap_or_default()
    }

    /// Сгенерировать речь для текста
    pub async fn generate(&self, text: &str, settings: &BioSettings) -> Result<SpeechResult> {
        let fallback;
        let tracker = match &self.progress_tracker {
            Some(tracker) => tracker,
            None => {
                fallback = ProgressTracker::new();
                &fallback
            }
        };

        let speech = self.synthesize_text(text, settings, tracker).await?;
        tracker.complete();
        Ok(speech)
    }

    /// Сгенерировать речь и субтитры
    pub async fn generate_package(&self, text: &str, settings: &BioSettings) -> Result<SpeechPackage> {
        let fallback;
        let tracker = match &self.progress_tracker {
            Some(tracker) => tracker,
            None => {
                fallback = ProgressTracker::new();
                &fallback
            }
        };

        let speech = self.synthesize_text(text, settings, tracker).await?;

        tracker.set_step(ProcessStep::SubtitleTiming);
        let cues = build_cues(&speech.metadata, &self.config.timeline);
        tracker.update_step_progress(100.0, Some(format!("{} субтитров", cues.len())));
        tracker.complete();

        log::info!(
            "Package ready: {:.1} s of audio, {} cues",
            speech.total_duration_ms() / 1000.0,
            cues.len()
        );

        Ok(SpeechPackage {
            speech,
            cues,
            format: self.config.audio,
        })
    }

    /// Сгенерировать речь с обратным вызовом прогресса
    pub async fn generate_speech(&self, params: GenerateSpeechParams) -> Result<SpeechResult> {
        let GenerateSpeechParams {
            text,
            settings,
            on_progress,
        } = params;

        match on_progress {
            Some(callback) => {
                let mut reporter = DefaultProgressReporter::new();
                reporter.add_observer(Box::new(PercentCallbackObserver::new(callback)));
                let tracker = ProgressTracker::with_reporter(Box::new(reporter));
                let speech = self.synthesize_text(&text, &settings, &tracker).await?;
                tracker.complete();
                Ok(speech)
            }
            None => self.generate(&text, &settings).await,
        }
    }

    async fn synthesize_text(
        &self,
        text: &str,
        settings: &BioSettings,
        tracker: &ProgressTracker,
    ) -> Result<SpeechResult> {
        if text.trim().is_empty() {
            return Err(NewscastError::EmptyInput);
        }

        tracker.reset();
        let chunks = segment(text, self.config.max_chunk_chars);
        log::info!(
            "Script of {} chars split into {} chunks",
            text.chars().count(),
            chunks.len()
        );
        tracker.update_step_progress(100.0, Some(format!("{} фрагментов", chunks.len())));

        self.orchestrator.run(&chunks, settings, tracker).await
    }
}

/// Сгенерировать речь с Gemini, взяв ключи из `GEMINI_API_KEYS`
pub async fn generate_speech(params: GenerateSpeechParams) -> Result<SpeechResult> {
    let tts = NewscastTts::from_env(
        NewscastConfig::default(),
        Arc::new(store::MemoryStore::new()),
    )?;
    tts.generate_speech(params).await
}
