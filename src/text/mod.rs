//! Модуль подготовки текста
//!
//! Разбиение сценария на фрагменты и очеловечивание фрагментов перед синтезом.

pub mod humanizer;
pub mod segmenter;

pub use humanizer::{humanize, performance_prompt, Humanized};
pub use segmenter::{segment, split_sentences, Chunk};
