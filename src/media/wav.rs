//! # WAV контейнер
//!
//! Упаковка сырого PCM потока провайдера (little-endian, 16 бит) в WAV
//! с помощью библиотеки hound.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};

use crate::error::{NewscastError, Result};
use crate::media::audio::AudioFormat;

/// Кодирует PCM байты в WAV контейнер в памяти.
///
/// Поддерживается только 16-битный PCM. Неполный последний семпл
/// (нечетное количество байт) отбрасывается.
pub fn encode_wav(pcm: &[u8], format: &AudioFormat) -> Result<Vec<u8>> {
    if format.bits_per_sample != 16 {
        return Err(NewscastError::Configuration(format!(
            "only 16-bit PCM can be wrapped in WAV, got {} bits",
            format.bits_per_sample
        )));
    }

    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: SampleFormat::Int,
    };

    if pcm.len() % 2 != 0 {
        warn!("PCM buffer has an odd length ({} bytes), dropping the trailing byte", pcm.len());
    }

    let mut buffer = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut buffer, spec)?;
        for pair in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
        }
        writer.finalize()?;
    }

    Ok(buffer.into_inner())
}

/// Кодирует PCM байты и сохраняет WAV файл
pub fn write_wav<P: AsRef<Path>>(path: P, pcm: &[u8], format: &AudioFormat) -> Result<()> {
    let bytes = encode_wav(pcm, format)?;
    std::fs::write(path.as_ref(), &bytes)?;
    info!(
        "Saved WAV file: {} ({} PCM bytes, {} Hz)",
        path.as_ref().display(),
        pcm.len(),
        format.sample_rate
    );
    Ok(())
}
