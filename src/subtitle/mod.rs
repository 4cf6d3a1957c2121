//! Модуль для работы с субтитрами
//!
//! Построение таймлайна субтитров по длительностям фрагментов и экспорт в SRT.

pub mod srt;
pub mod timeline;

pub use srt::{format_srt_time, save_srt, write_srt};
pub use timeline::{build_cues, count_syllables, SubtitleCue, TimelineOptions};
