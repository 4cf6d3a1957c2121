//! Модуль разбиения сценария на фрагменты
//!
//! Текст делится на предложения по терминальной пунктуации, после чего
//! предложения жадно собираются во фрагменты не длиннее заданного лимита.

use serde::{Deserialize, Serialize};

/// Фрагмент сценария, единица работы синтеза
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Порядковый номер фрагмента
    pub index: usize,
    /// Текст фрагмента
    pub text: String,
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Разбить текст на предложения.
///
/// Каждый отрезок включает серию терминальных знаков и следующие за ней
/// пробелы, так что конкатенация отрезков в точности равна исходному тексту.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        // Поглощаем серию терминаторов ("?!", "...") и пробелы после нее
        while let Some(&(_, next)) = chars.peek() {
            if is_terminal(next) || next.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }
        let end = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
        spans.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        spans.push(&text[start..]);
    }

    spans
}

/// Разбить сценарий на фрагменты длиной не более `max_chars` символов.
///
/// Предложение длиннее лимита не режется и образует отдельный фрагмент.
pub fn segment(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for span in split_sentences(text) {
        let sentence = span.trim();
        if sentence.is_empty() {
            continue;
        }
        let sentence_len = sentence.chars().count();

        if current_len > 0 && current_len + 1 + sentence_len > max_chars {
            chunks.push(Chunk {
                index: chunks.len(),
                text: std::mem::take(&mut current),
            });
            current_len = 0;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += sentence_len;
    }

    if current_len > 0 {
        chunks.push(Chunk {
            index: chunks.len(),
            text: current,
        });
    }

    log::debug!("Segmented {} chars into {} chunks", text.chars().count(), chunks.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_split_sentences_is_lossless() {
        let text = "Good evening.  Our top story?! Markets...rallied\nthen fell";
        let spans = split_sentences(text);
        assert_eq!(spans.concat(), text);
        assert_eq!(spans[0], "Good evening.  ");
        assert_eq!(spans[1], "Our top story?! ");
        assert_eq!(spans[2], "Markets...");
        assert_eq!(spans[3], "rallied\n");
        assert_eq!(spans[4], "then fell");
    }

    #[test]
    fn test_single_chunk_when_under_limit() {
        let chunks = segment("Stocks rose today. Markets closed higher.", 300);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "Stocks rose today. Markets closed higher.");
    }

    #[test]
    fn test_chunks_respect_ceiling_and_reconstruct_input() {
        let text = "The council met on Monday. It approved the budget! Critics objected loudly? \
                    Officials said the plan will be revised next year.\nMore updates follow tonight.";
        for max in [20, 40, 60, 100, 1000] {
            let chunks = segment(text, max);
            let joined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
            assert_eq!(normalize(&joined), normalize(text), "max={}", max);

            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.index, i);
                assert!(!chunk.text.is_empty());
                let len = chunk.text.chars().count();
                if len > max {
                    // Допустимо только для одиночного длинного предложения
                    assert_eq!(split_sentences(&chunk.text).len(), 1, "max={} chunk={:?}", max, chunk);
                }
            }
        }
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let long = "This single sentence is definitely longer than the tiny limit we configure.";
        let chunks = segment(&format!("Short one. {} Tail.", long), 15);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, long);
    }

    #[test]
    fn test_blank_input_yields_no_chunks() {
        assert!(segment("", 100).is_empty());
        assert!(segment(" \n\n  ", 100).is_empty());
    }

    #[test]
    fn test_ceiling_counts_chars_not_bytes() {
        let chunks = segment("Привет мир. Как дела.", 11);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Привет мир.");
    }
}
