//! Модуль очеловечивания речи
//!
//! Превращает фрагмент текста в SSML-подобную разметку с запинками,
//! словами-паразитами, колебаниями темпа и громкости и паузами между
//! предложениями. Параллельно собирается чистый текст без разметки, который
//! дальше используется для построения субтитров.

use rand::Rng;

use crate::config::{BioSettings, HumanizerConfig, Persona, WaitDuration};
use crate::text::segmenter::split_sentences;

/// Пауза после повторенного слова при запинке, мс
const STUTTER_BREAK_MS: u32 = 150;
/// Пауза после слова-паразита, мс
const FILLER_BREAK_MS: u32 = 250;
/// Естественная пауза между предложениями, мс
const NATURAL_PAUSE_MS: u32 = 400;
/// Пауза диктора новостей, мс
const LONG_PAUSE_MS: u32 = 1000;
/// Диапазон случайной паузы, мс
const RANDOM_PAUSE_MS: std::ops::Range<u32> = 200..1000;
/// Запинка ставится только на одно из первых слов предложения
const STUTTER_WINDOW: usize = 3;
const FILLER_WORDS: [&str; 2] = ["uhm", "err"];
const MIN_RATE: f64 = 0.5;
const MAX_RATE: f64 = 2.0;

/// Результат очеловечивания фрагмента
#[derive(Debug, Clone, PartialEq)]
pub struct Humanized {
    /// Разметка для провайдера синтеза
    pub annotated: String,
    /// Исходные предложения без разметки
    pub plain: String,
}

/// Очеловечить фрагмент текста
pub fn humanize<R: Rng>(
    chunk_text: &str,
    settings: &BioSettings,
    persona_rate: f64,
    config: &HumanizerConfig,
    rng: &mut R,
) -> Humanized {
    let mut annotated = String::from("<speak>");
    let mut plain = String::new();
    let mut sentence_index = 0usize;

    for span in split_sentences(chunk_text) {
        let sentence = span.trim();
        if sentence.is_empty() {
            continue;
        }

        if sentence_index > 0 {
            let pause = pause_ms(settings.wait_duration, rng);
            annotated.push_str(&format!("<break time=\"{}ms\"/>", pause));
        }

        let mut spoken = String::new();
        if chance(rng, settings.filler_rate / config.filler_divisor) {
            let filler = FILLER_WORDS[rng.gen_range(0..FILLER_WORDS.len())];
            spoken.push_str(&format!("{},<break time=\"{}ms\"/> ", filler, FILLER_BREAK_MS));
        }

        let stutter = chance(rng, settings.stutter_rate / config.stutter_divisor);
        spoken.push_str(&stutter_sentence(sentence, stutter, rng));

        let rate = sentence_rate(persona_rate, settings.speed_variation, rng);
        let volume = volume_db(settings.volume_variation, config.max_volume_db, rng);
        annotated.push_str(&format!(
            "<prosody rate=\"{:.2}\" volume=\"{:+.1}dB\">{}</prosody>",
            rate, volume, spoken
        ));

        if !plain.is_empty() {
            plain.push(' ');
        }
        plain.push_str(sentence);
        sentence_index += 1;
    }

    annotated.push_str("</speak>");
    Humanized { annotated, plain }
}

/// Собрать текстовое указание к исполнению для провайдера
pub fn performance_prompt(persona: Persona, settings: &BioSettings, annotated: &str) -> String {
    let mut prompt = format!(
        "PERFORM AS: {}. STYLE: {} BREATHING: {}.",
        persona.display_name(),
        persona.style_hint(),
        settings.breath_intensity.as_str()
    );
    if settings.asymmetry {
        prompt.push_str(" DELIVERY: slightly uneven emphasis between phrases, like live speech.");
    }
    if settings.ambient_sounds {
        prompt.push_str(" AMBIENCE: faint newsroom room tone.");
    }
    prompt.push_str(" TEXT: ");
    prompt.push_str(annotated);
    prompt
}

fn chance<R: Rng>(rng: &mut R, probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < probability.min(1.0)
}

/// Повторить одно из первых слов с короткой паузой
fn stutter_sentence<R: Rng>(sentence: &str, stutter: bool, rng: &mut R) -> String {
    let mut words: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
    // не больше двух слов: без повтора
    if !stutter || words.len() <= 2 {
        return sentence.to_string();
    }
    let idx = rng.gen_range(0..words.len().min(STUTTER_WINDOW));
    let word = words[idx].clone();
    words[idx] = format!("{}...<break time=\"{}ms\"/> {}", word, STUTTER_BREAK_MS, word);
    words.join(" ")
}

fn sentence_rate<R: Rng>(persona_rate: f64, speed_variation: f64, rng: &mut R) -> f64 {
    let range = (speed_variation / 100.0).max(0.0);
    let jitter = if range > 0.0 { rng.gen_range(-range..=range) } else { 0.0 };
    (persona_rate + jitter).clamp(MIN_RATE, MAX_RATE)
}

fn volume_db<R: Rng>(volume_variation: f64, max_db: f64, rng: &mut R) -> f64 {
    let range = (volume_variation / 100.0).max(0.0) * max_db;
    if range > 0.0 {
        rng.gen_range(-range..=range)
    } else {
        0.0
    }
}

fn pause_ms<R: Rng>(mode: WaitDuration, rng: &mut R) -> u32 {
    match mode {
        WaitDuration::Natural => NATURAL_PAUSE_MS,
        WaitDuration::Long => LONG_PAUSE_MS,
        WaitDuration::Random => rng.gen_range(RANDOM_PAUSE_MS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreathIntensity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn calm_settings() -> BioSettings {
        BioSettings {
            stutter_rate: 0.0,
            filler_rate: 0.0,
            volume_variation: 0.0,
            speed_variation: 0.0,
            asymmetry: false,
            ambient_sounds: false,
            ..BioSettings::default()
        }
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = BioSettings {
            stutter_rate: 100.0,
            filler_rate: 100.0,
            ..BioSettings::default()
        };
        let text = "Stocks rose today. Markets closed higher on strong earnings!";
        let result = humanize(text, &settings, 1.05, &HumanizerConfig::default(), &mut rng);
        assert_eq!(result.plain, text);
        assert!(!result.plain.contains('<'));
    }

    #[test]
    fn test_calm_markup_structure() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = humanize(
            "First one. Second one.",
            &calm_settings(),
            1.0,
            &HumanizerConfig::default(),
            &mut rng,
        );
        assert_eq!(
            result.annotated,
            "<speak><prosody rate=\"1.00\" volume=\"+0.0dB\">First one.</prosody>\
             <break time=\"400ms\"/><prosody rate=\"1.00\" volume=\"+0.0dB\">Second one.</prosody></speak>"
        );
    }

    #[test]
    fn test_long_pause_between_sentences_only() {
        let mut rng = StdRng::seed_from_u64(3);
        let settings = BioSettings {
            wait_duration: WaitDuration::Long,
            ..calm_settings()
        };
        let result = humanize("A. B. C.", &settings, 1.0, &HumanizerConfig::default(), &mut rng);
        assert_eq!(result.annotated.matches("<break time=\"1000ms\"/>").count(), 2);
        assert!(result.annotated.starts_with("<speak><prosody"));
    }

    #[test]
    fn test_random_pause_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let pause = pause_ms(WaitDuration::Random, &mut rng);
            assert!((200..1000).contains(&pause));
        }
    }

    #[test]
    fn test_stutter_duplicates_an_early_word() {
        let mut rng = StdRng::seed_from_u64(5);
        let settings = BioSettings {
            stutter_rate: 100.0,
            ..calm_settings()
        };
        let result = humanize(
            "Officials confirmed the report tonight.",
            &settings,
            1.0,
            &HumanizerConfig::default(),
            &mut rng,
        );
        let stuttered = ["Officials", "confirmed", "the"]
            .iter()
            .any(|w| result.annotated.contains(&format!("{}...<break time=\"150ms\"/> {}", w, w)));
        assert!(stuttered, "{}", result.annotated);
    }

    #[test]
    fn test_stutter_ignores_repeated_spaces() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let out = stutter_sentence("Rates   held  steady.", true, &mut rng);
            assert!(!out.contains("...<break time=\"150ms\"/>  "), "{}", out);
            assert!(!out.starts_with("..."), "{}", out);
            let repeated = ["Rates", "held", "steady."]
                .iter()
                .any(|w| out.contains(&format!("{}...<break time=\"150ms\"/> {}", w, w)));
            assert!(repeated, "{}", out);
        }

        // два слова, разделенные несколькими пробелами, остаются как есть
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(stutter_sentence("Rates   held.", true, &mut rng), "Rates   held.");
    }

    #[test]
    fn test_short_sentence_never_stutters() {
        let mut rng = StdRng::seed_from_u64(5);
        let settings = BioSettings {
            stutter_rate: 100.0,
            ..calm_settings()
        };
        let result = humanize("Breaking news.", &settings, 1.0, &HumanizerConfig::default(), &mut rng);
        assert!(!result.annotated.contains("..."));
    }

    #[test]
    fn test_rate_jitter_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let rate = sentence_rate(1.05, 30.0, &mut rng);
            assert!(rate >= 0.75 - 1e-9 && rate <= 1.35 + 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_markup() {
        let settings = BioSettings::default();
        let text = "The storm moved east. Schools will reopen Friday, officials said.";
        let a = humanize(text, &settings, 1.05, &HumanizerConfig::default(), &mut StdRng::seed_from_u64(42));
        let b = humanize(text, &settings, 1.05, &HumanizerConfig::default(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_performance_prompt_carries_directives() {
        let settings = BioSettings {
            breath_intensity: BreathIntensity::Loud,
            asymmetry: true,
            ambient_sounds: true,
            ..BioSettings::default()
        };
        let prompt = performance_prompt(Persona::ReporterBeta, &settings, "<speak>x</speak>");
        assert!(prompt.starts_with("PERFORM AS: Reporter Beta. STYLE: Youthful, energetic reporter."));
        assert!(prompt.contains("BREATHING: loud."));
        assert!(prompt.contains("DELIVERY:"));
        assert!(prompt.contains("AMBIENCE:"));
        assert!(prompt.ends_with("TEXT: <speak>x</speak>"));
    }
}
