//! Упаковка результата в ZIP архив
//!
//! Архив содержит аудио выпуска и субтитры с общим базовым именем.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::media::audio::AudioFormat;
use crate::media::wav::encode_wav;
use crate::subtitle::srt::write_srt;
use crate::subtitle::timeline::SubtitleCue;
use crate::tts::provider::SpeechResult;

/// Готовый выпуск: речь и субтитры
#[derive(Debug, Clone)]
pub struct SpeechPackage {
    pub speech: SpeechResult,
    pub cues: Vec<SubtitleCue>,
    /// Формат PCM потока в `speech.audio_data`
    pub format: AudioFormat,
}

/// Пути к файлам сохраненного выпуска
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePaths {
    pub wav: PathBuf,
    pub srt: PathBuf,
    pub zip: PathBuf,
}

impl SpeechPackage {
    /// Субтитры в формате SRT
    pub fn srt(&self) -> String {
        write_srt(&self.cues)
    }

    /// Аудио в WAV контейнере
    pub fn wav(&self) -> Result<Vec<u8>> {
        encode_wav(&self.speech.audio_data, &self.format)
    }

    /// Сохранить `{name}.wav`, `{name}.srt` и `{name}.zip` в каталог
    pub fn save<P: AsRef<Path>>(&self, dir: P, name: &str) -> Result<PackagePaths> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let base = sanitize_name(name);

        let wav = self.wav()?;
        let srt = self.srt();

        let paths = PackagePaths {
            wav: dir.join(format!("{}.wav", base)),
            srt: dir.join(format!("{}.srt", base)),
            zip: dir.join(format!("{}.zip", base)),
        };
        std::fs::write(&paths.wav, &wav)?;
        std::fs::write(&paths.srt, &srt)?;
        write_zip(&paths.zip, &base, &wav, &srt)?;
        Ok(paths)
    }
}

/// Привести имя выпуска к безопасному имени файла.
///
/// Двоеточия (например, из метки времени) заменяются точками, разделители
/// путей подчеркиваниями.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            ':' => '.',
            '/' | '\\' => '_',
            other => other,
        })
        .collect();
    if cleaned.is_empty() {
        "newscast".to_string()
    } else {
        cleaned
    }
}

/// Собрать ZIP архив в памяти: `{name}.wav` и `{name}.srt`
pub fn package_bytes(base_name: &str, wav: &[u8], srt: &str) -> Result<Vec<u8>> {
    let name = sanitize_name(base_name);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    // Аудио хранится без сжатия
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(format!("{}.wav", name), stored)?;
    zip.write_all(wav)?;
    zip.start_file(format!("{}.srt", name), deflated)?;
    zip.write_all(srt.as_bytes())?;

    let cursor = zip.finish()?;
    log::debug!("Packaged {} ({} bytes audio, {} bytes subtitles)", name, wav.len(), srt.len());
    Ok(cursor.into_inner())
}

/// Записать ZIP архив на диск
pub fn write_zip<P: AsRef<Path>>(path: P, base_name: &str, wav: &[u8], srt: &str) -> Result<()> {
    let bytes = package_bytes(base_name, wav, srt)?;
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path.as_ref(), bytes)?;
    log::info!("Package written to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("news 12:30:00"), "news 12.30.00");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("   "), "newscast");
    }

    #[test]
    fn test_speech_package_save() {
        let dir = tempdir().unwrap();
        let package = SpeechPackage {
            speech: SpeechResult {
                audio_data: vec![0u8; 4800],
                metadata: vec![crate::tts::provider::ChunkMetadata {
                    text: "Hello there.".to_string(),
                    duration_ms: 100.0,
                }],
            },
            cues: vec![SubtitleCue {
                start_ms: 150.0,
                end_ms: 900.0,
                text: "Hello there.".to_string(),
            }],
            format: AudioFormat::default(),
        };

        let paths = package.save(dir.path(), "evening:news").unwrap();
        assert_eq!(paths.wav.file_name().unwrap(), "evening.news.wav");
        assert!(paths.zip.exists());

        let reader = hound::WavReader::open(&paths.wav).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.len(), 2400);
        assert!(std::fs::read_to_string(&paths.srt)
            .unwrap()
            .contains("00:00:00,150 --> 00:00:00,900"));
    }

    #[test]
    fn test_write_zip_contains_both_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("bulletin.zip");
        let srt = "1\n00:00:00,150 --> 00:00:00,900\nHello.\n";

        write_zip(&path, "bulletin 09:00", &[1, 2, 3, 4], srt).unwrap();

        let mut archive = ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut audio = Vec::new();
        archive
            .by_name("bulletin 09.00.wav")
            .unwrap()
            .read_to_end(&mut audio)
            .unwrap();
        assert_eq!(audio, vec![1, 2, 3, 4]);

        let mut text = String::new();
        archive
            .by_name("bulletin 09.00.srt")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, srt);
    }
}
