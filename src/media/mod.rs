//! Модуль для работы с аудио результатом
//!
//! PCM поток провайдера, его длительность и WAV контейнер.

pub mod audio;
pub mod wav;
