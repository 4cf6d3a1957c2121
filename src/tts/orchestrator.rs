//! Оркестратор синтеза речи
//!
//! Фрагменты обрабатываются строго последовательно: очеловечивание, выбор
//! ключа, вызов провайдера с повторами. Результаты собираются по индексу,
//! поэтому порядок аудио не зависит от числа повторов.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::{BioSettings, NewscastConfig, Persona};
use crate::error::{ErrorKind, NewscastError, Result, SynthesisError};
use crate::media::audio::concat_pcm;
use crate::progress::{ProcessStep, ProgressTracker};
use crate::text::{humanize, performance_prompt, Chunk};
use crate::tts::credentials::CredentialPool;
use crate::tts::provider::{ChunkMetadata, SpeechResult, SynthesisRequest, SynthesisResult, Synthesizer};
use crate::tts::retry::retry_with_backoff;

/// Оркестратор синтеза
pub struct Orchestrator {
    synthesizer: Arc<dyn Synthesizer>,
    pool: Arc<CredentialPool>,
    config: NewscastConfig,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        pool: Arc<CredentialPool>,
        config: NewscastConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            synthesizer,
            pool,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Пул ключей оркестратора
    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Синтезировать все фрагменты и склеить аудио в исходном порядке.
    ///
    /// Исчерпание попыток на любом фрагменте прерывает запуск целиком,
    /// частичное аудио не возвращается.
    pub async fn run(
        &self,
        chunks: &[Chunk],
        settings: &BioSettings,
        tracker: &ProgressTracker,
    ) -> Result<SpeechResult> {
        if chunks.is_empty() {
            return Err(NewscastError::EmptyInput);
        }

        tracker.set_step(ProcessStep::SpeechGeneration);
        let personas = self.persona_schedule();
        let total = chunks.len();
        let mut results: Vec<SynthesisResult> = Vec::with_capacity(total);

        log::info!("Synthesizing {} chunks", total);

        for (position, chunk) in chunks.iter().enumerate() {
            let persona = personas[position % personas.len()];
            let outcome = self.synthesize_chunk(chunk, persona, settings).await;

            let completed = position + 1;
            let percent = (100.0 * completed as f64 / total as f64).round();
            tracker.update_step_progress(
                percent as f32,
                Some(format!("фрагмент {}/{}", completed, total)),
            );

            match outcome {
                Ok(result) => {
                    log::info!(
                        "Chunk {}/{} synthesized as {} ({:.0} ms)",
                        completed,
                        total,
                        persona.display_name(),
                        result.duration_ms
                    );
                    results.push(result);
                }
                Err(e) => {
                    log::error!("Aborting run: {}", e);
                    return Err(e);
                }
            }

            if completed < total && self.config.inter_chunk_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.inter_chunk_delay_ms)).await;
            }
        }

        results.sort_by_key(|r| r.index);
        let audio_data = concat_pcm(results.iter().map(|r| r.audio.as_slice()));
        let metadata = results
            .into_iter()
            .map(|r| ChunkMetadata {
                text: r.plain_text,
                duration_ms: r.duration_ms,
            })
            .collect();

        Ok(SpeechResult {
            audio_data,
            metadata,
        })
    }

    /// Порядок персон на запуск: каталог, перемешанный один раз
    fn persona_schedule(&self) -> Vec<Persona> {
        let mut personas = Persona::ALL.to_vec();
        personas.shuffle(&mut *self.rng.lock());
        personas
    }

    async fn synthesize_chunk(
        &self,
        chunk: &Chunk,
        persona: Persona,
        settings: &BioSettings,
    ) -> Result<SynthesisResult> {
        let humanized = {
            let mut rng = self.rng.lock();
            humanize(
                &chunk.text,
                settings,
                persona.base_rate(),
                &self.config.humanizer,
                &mut *rng,
            )
        };
        let prompt = performance_prompt(persona, settings, &humanized.annotated);
        let request = SynthesisRequest {
            chunk: chunk.clone(),
            persona,
            annotated_text: humanized.annotated,
            prompt,
        };

        let pool = &self.pool;
        let synthesizer = &self.synthesizer;
        let request_ref = &request;

        let audio = retry_with_backoff(&self.config.retry, |attempt| async move {
            let credential = pool.select();
            log::debug!(
                "Chunk {} attempt {} using credential {}",
                request_ref.chunk.index + 1,
                attempt + 1,
                credential.id
            );
            match synthesizer.synthesize(request_ref, &credential).await {
                Ok(audio) if audio.is_empty() => Err(SynthesisError::Malformed(
                    "provider returned empty audio".to_string(),
                )),
                Ok(audio) => {
                    pool.mark_succeeded(&credential.id);
                    Ok(audio)
                }
                Err(e) => {
                    if e.kind() == ErrorKind::QuotaOrAuth {
                        pool.mark_failed(&credential.id);
                    }
                    Err(e)
                }
            }
        })
        .await
        .map_err(|exhausted| NewscastError::ChunkFailed {
            index: chunk.index,
            attempts: exhausted.attempts,
            source: exhausted.last_error,
        })?;

        Ok(SynthesisResult {
            index: chunk.index,
            duration_ms: self.config.audio.duration_ms(audio.len()),
            audio,
            plain_text: humanized.plain,
        })
    }
}
