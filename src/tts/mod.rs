//! Модуль для работы с TTS
//!
//! Синтез речи по фрагментам: провайдер, ротация ключей, повторы и
//! оркестрация всего выпуска.

pub mod credentials;
pub mod gemini;
pub mod orchestrator;
pub mod provider;
pub mod retry;

pub use credentials::{Clock, Credential, CredentialPool, CredentialStatus, ManualClock, SystemClock};
pub use gemini::GeminiSynthesizer;
pub use orchestrator::Orchestrator;
pub use provider::{ChunkMetadata, SpeechResult, SynthesisRequest, SynthesisResult, Synthesizer};
pub use retry::{retry_with_backoff, RetryExhausted, RetryPolicy};
