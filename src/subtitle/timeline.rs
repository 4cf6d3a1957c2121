//! Построение таймлайна субтитров
//!
//! Длительность каждого фрагмента распределяется между словами пропорционально
//! числу слогов, с учетом пауз на знаках препинания. Слова собираются в
//! субтитры не длиннее заданного лимита символов.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tts::provider::ChunkMetadata;

lazy_static! {
    static ref NON_LETTERS: Regex = Regex::new(r"[^a-z]").unwrap();
    static ref SILENT_SUFFIX: Regex = Regex::new(r"(?:[^laeiouy]es|ed|[^laeiouy]e)$").unwrap();
    static ref LEADING_Y: Regex = Regex::new(r"^y").unwrap();
    static ref VOWEL_GROUP: Regex = Regex::new(r"[aeiouy]{1,2}").unwrap();
}

const FILLER_WORDS: [&str; 4] = ["uhm", "err", "um", "uh"];

/// Параметры построения субтитров
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineOptions {
    /// Тишина в начале фрагмента, мс
    pub lead_in_ms: f64,
    /// Тишина в конце фрагмента, мс
    pub lead_out_ms: f64,
    /// Минимальное время на речь во фрагменте, мс
    pub min_vocal_ms: f64,
    /// Максимальная длина субтитра в символах
    pub max_cue_chars: usize,
    /// Пауза после конца предложения, мс
    pub sentence_pause_ms: f64,
    /// Пауза после запятой, точки с запятой или двоеточия, мс
    pub clause_pause_ms: f64,
    /// Пауза после запинки, мс
    pub stutter_pause_ms: f64,
    /// Добавка за слово-паразит, мс
    pub filler_pause_ms: f64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            lead_in_ms: 150.0,
            lead_out_ms: 100.0,
            min_vocal_ms: 100.0,
            max_cue_chars: 80,
            sentence_pause_ms: 600.0,
            clause_pause_ms: 250.0,
            stutter_pause_ms: 400.0,
            filler_pause_ms: 350.0,
        }
    }
}

/// Один субтитр
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start_ms: f64,
    pub end_ms: f64,
    pub text: String,
}

/// Оценить число слогов в английском слове
pub fn count_syllables(word: &str) -> usize {
    let lowered = word.to_lowercase();
    let letters = NON_LETTERS.replace_all(&lowered, "");
    if letters.len() <= 3 {
        return 1;
    }
    let trimmed = SILENT_SUFFIX.replace(&letters, "");
    let trimmed = LEADING_Y.replace(&trimmed, "");
    VOWEL_GROUP.find_iter(&trimmed).count().max(1)
}

/// Вес паузы после слова, мс
fn pause_weight(word: &str, options: &TimelineOptions) -> f64 {
    let mut pause = if word.ends_with(['.', '!', '?']) {
        options.sentence_pause_ms
    } else if word.ends_with([',', ';', ':']) {
        options.clause_pause_ms
    } else if word.contains("...") {
        options.stutter_pause_ms
    } else {
        0.0
    };

    let bare: String = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if FILLER_WORDS.contains(&bare.as_str()) {
        pause += options.filler_pause_ms;
    }
    pause
}

struct WordTiming<'a> {
    text: &'a str,
    syllables: usize,
    pause_ms: f64,
}

struct Cluster<'a> {
    words: Vec<&'a str>,
    chars: usize,
    syllables: usize,
    pause_ms: f64,
}

impl<'a> Cluster<'a> {
    fn new() -> Self {
        Self {
            words: Vec::new(),
            chars: 0,
            syllables: 0,
            pause_ms: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Длина текста субтитра после добавления слова
    fn len_with(&self, word: &str) -> usize {
        let extra = word.chars().count();
        if self.is_empty() {
            extra
        } else {
            self.chars + 1 + extra
        }
    }

    fn push(&mut self, word: &WordTiming<'a>) {
        self.chars = self.len_with(word.text);
        self.words.push(word.text);
        self.syllables += word.syllables;
        self.pause_ms += word.pause_ms;
    }
}

/// Построить субтитры для последовательности фрагментов.
///
/// Время накапливается по номинальным длительностям фрагментов; внутри
/// фрагмента слова получают время пропорционально слогам.
pub fn build_cues(chunks: &[ChunkMetadata], options: &TimelineOptions) -> Vec<SubtitleCue> {
    let mut cues = Vec::new();
    let mut cursor = 0.0;

    for chunk in chunks {
        build_chunk_cues(chunk, cursor, options, &mut cues);
        cursor += chunk.duration_ms;
    }

    log::debug!("Built {} cues over {:.0} ms", cues.len(), cursor);
    cues
}

fn build_chunk_cues(
    chunk: &ChunkMetadata,
    cursor: f64,
    options: &TimelineOptions,
    cues: &mut Vec<SubtitleCue>,
) {
    let words: Vec<WordTiming> = chunk
        .text
        .split_whitespace()
        .map(|text| WordTiming {
            text,
            syllables: count_syllables(text),
            pause_ms: pause_weight(text, options),
        })
        .collect();
    if words.is_empty() {
        return;
    }

    let total_syllables: usize = words.iter().map(|w| w.syllables).sum();
    let total_pause: f64 = words.iter().map(|w| w.pause_ms).sum();

    // Фрагмент короче обрамления: отступы и минимум речи сжимаются вместе,
    // чтобы субтитры не вышли за границы фрагмента
    let frame = options.lead_in_ms + options.lead_out_ms + options.min_vocal_ms;
    let frame_scale = if chunk.duration_ms < frame && frame > 0.0 {
        chunk.duration_ms.max(0.0) / frame
    } else {
        1.0
    };
    let lead_in_ms = options.lead_in_ms * frame_scale;
    let min_vocal_ms = options.min_vocal_ms * frame_scale;
    let available = chunk.duration_ms.max(0.0) - lead_in_ms - options.lead_out_ms * frame_scale;

    // Если паузы не помещаются, они сжимаются пропорционально, а речь
    // получает минимум min_vocal_ms
    let (vocal_ms, pause_scale) = if available - total_pause >= min_vocal_ms {
        (available - total_pause, 1.0)
    } else {
        let budget = (available - min_vocal_ms).max(0.0);
        let scale = if total_pause > 0.0 {
            budget / total_pause
        } else {
            1.0
        };
        (min_vocal_ms, scale)
    };
    let ms_per_syllable = vocal_ms / total_syllables as f64;

    let mut offset = lead_in_ms;
    let mut flush = |cluster: &Cluster, cues: &mut Vec<SubtitleCue>| {
        let duration =
            cluster.syllables as f64 * ms_per_syllable + cluster.pause_ms * pause_scale;
        let start_ms = cursor + offset;
        offset += duration;
        cues.push(SubtitleCue {
            start_ms,
            end_ms: cursor + offset,
            text: cluster.words.join(" "),
        });
    };

    let mut cluster = Cluster::new();
    let last = words.len() - 1;
    for (i, word) in words.iter().enumerate() {
        if i != last && !cluster.is_empty() && cluster.len_with(word.text) > options.max_cue_chars {
            flush(&cluster, cues);
            cluster = Cluster::new();
        }
        cluster.push(word);
    }
    flush(&cluster, cues);
}
