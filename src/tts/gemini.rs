//! Модуль для интеграции с Gemini TTS API
//!
//! Отправляет текст с указанием голоса в `generateContent` и достает из
//! ответа base64 PCM. Ошибки классифицируются так, чтобы цикл повторов знал,
//! отправлять ли ключ на охлаждение.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GeminiConfig;
use crate::error::{NewscastError, Result, SynthesisError};
use crate::tts::credentials::Credential;
use crate::tts::provider::{SynthesisRequest, Synthesizer};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'a str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

/// Клиент Gemini TTS
pub struct GeminiSynthesizer {
    client: Client,
    config: GeminiConfig,
}

impl GeminiSynthesizer {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NewscastError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Synthesizer for GeminiSynthesizer {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        credential: &Credential,
    ) -> std::result::Result<Vec<u8>, SynthesisError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: request.persona.voice().as_str(),
                        },
                    },
                },
            },
        };

        log::debug!(
            "Sending TTS request for chunk {} ({} chars, voice {}, credential {})",
            request.chunk.index,
            request.prompt.len(),
            request.persona.voice().as_str(),
            credential.id
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential.api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        let audio = extract_audio(&text)?;
        log::debug!("Received {} PCM bytes for chunk {}", audio.len(), request.chunk.index);
        Ok(audio)
    }
}

/// Классифицировать неуспешный HTTP ответ
fn classify_failure(status: StatusCode, body: &str) -> SynthesisError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect());
    let detail = format!("HTTP {}: {}", status.as_u16(), message);
    let lowered = body.to_lowercase();

    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("quota")
        || lowered.contains("resource_exhausted")
    {
        SynthesisError::RateLimited(detail)
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || lowered.contains("api_key_invalid")
        || lowered.contains("api key not valid")
    {
        SynthesisError::AuthInvalid(detail)
    } else {
        SynthesisError::Transient(detail)
    }
}

/// Достать и декодировать аудио из успешного ответа
fn extract_audio(body: &str) -> std::result::Result<Vec<u8>, SynthesisError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| SynthesisError::Malformed(format!("invalid JSON response: {}", e)))?;

    let encoded = parsed
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .find_map(|p| p.inline_data.as_ref())
        .map(|d| d.data.as_str())
        .ok_or_else(|| {
            SynthesisError::Malformed(
                "provider returned no audio data (content may have been blocked)".to_string(),
            )
        })?;

    let audio = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| SynthesisError::Malformed(format!("invalid base64 audio: {}", e)))?;

    if audio.is_empty() {
        return Err(SynthesisError::Malformed("provider returned empty audio".to_string()));
    }
    Ok(audio)
}
