use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Persona;
use crate::error::SynthesisError;
use crate::text::Chunk;
use crate::tts::credentials::Credential;

/// Запрос на синтез одного фрагмента
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub chunk: Chunk,
    pub persona: Persona,
    /// Разметка очеловеченного текста
    pub annotated_text: String,
    /// Полный текст запроса к провайдеру (указания к исполнению + разметка)
    pub prompt: String,
}

/// Провайдер синтеза речи
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Синтезировать фрагмент, вернуть сырые PCM байты
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        credential: &Credential,
    ) -> Result<Vec<u8>, SynthesisError>;
}

/// Результат синтеза одного фрагмента
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Индекс фрагмента
    pub index: usize,
    /// PCM аудио фрагмента
    pub audio: Vec<u8>,
    /// Текст фрагмента без разметки
    pub plain_text: String,
    /// Длительность аудио, мс
    pub duration_ms: f64,
}

/// Метаданные фрагмента для построения субтитров
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub text: String,
    pub duration_ms: f64,
}

/// Итог генерации речи
#[derive(Debug, Clone)]
pub struct SpeechResult {
    /// Склеенный PCM поток в порядке фрагментов
    pub audio_data: Vec<u8>,
    /// Метаданные фрагментов в том же порядке
    pub metadata: Vec<ChunkMetadata>,
}

impl SpeechResult {
    /// Общая номинальная длительность, мс
    pub fn total_duration_ms(&self) -> f64 {
        self.metadata.iter().map(|m| m.duration_ms).sum()
    }
}
