//! Запись субтитров в формате SRT

use std::path::Path;

use crate::error::Result;
use crate::subtitle::timeline::SubtitleCue;

/// Отформатировать миллисекунды как метку времени SRT (HH:MM:SS,mmm).
///
/// Дробная часть миллисекунд отбрасывается, отрицательные значения приводятся к нулю.
pub fn format_srt_time(ms: f64) -> String {
    let ms = ms.max(0.0).floor() as u64;

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Собрать текст SRT из списка субтитров
pub fn write_srt(cues: &[SubtitleCue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_ms),
            format_srt_time(cue.end_ms)
        ));
        output.push_str(&cue.text);
        output.push('\n');
    }

    output
}

/// Сохранить субтитры в файл
pub fn save_srt<P: AsRef<Path>>(path: P, cues: &[SubtitleCue]) -> Result<()> {
    std::fs::write(path, write_srt(cues))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(150.0), "00:00:00,150");
        assert_eq!(format_srt_time(61_001.4), "00:01:01,001");
        assert_eq!(format_srt_time(3_723_456.0), "01:02:03,456");
        assert_eq!(format_srt_time(-20.0), "00:00:00,000");
    }

    #[test]
    fn test_format_srt_time_truncates_fraction() {
        assert_eq!(format_srt_time(899.999), "00:00:00,899");
        assert_eq!(format_srt_time(59_999.9), "00:00:59,999");
        assert_eq!(format_srt_time(0.6), "00:00:00,000");
    }

    #[test]
    fn test_write_srt() {
        let cues = vec![
            SubtitleCue {
                start_ms: 150.0,
                end_ms: 900.0,
                text: "Stocks rose today.".to_string(),
            },
            SubtitleCue {
                start_ms: 1150.0,
                end_ms: 2400.5,
                text: "Markets closed higher.".to_string(),
            },
        ];
        assert_eq!(
            write_srt(&cues),
            "1\n00:00:00,150 --> 00:00:00,900\nStocks rose today.\n\n\
             2\n00:00:01,150 --> 00:00:02,400\nMarkets closed higher.\n"
        );
        assert_eq!(write_srt(&[]), "");
    }
}
