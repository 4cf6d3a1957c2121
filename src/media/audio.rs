//! Модуль для работы с PCM потоком провайдера
//!
//! Провайдер возвращает сырые линейные PCM байты; здесь вычисляется их
//! длительность и выполняется склейка фрагментов.

use serde::{Deserialize, Serialize};

/// Формат PCM потока
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AudioFormat {
    /// Частота дискретизации, Гц
    pub sample_rate: u32,
    /// Количество каналов
    pub channels: u16,
    /// Разрядность семпла
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl AudioFormat {
    /// Количество байт на один кадр (все каналы)
    pub fn block_align(&self) -> u32 {
        self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }

    /// Количество байт в секунде звука
    pub fn bytes_per_second(&self) -> u32 {
        self.sample_rate * self.block_align()
    }

    /// Длительность PCM буфера указанной длины в миллисекундах
    pub fn duration_ms(&self, byte_len: usize) -> f64 {
        let rate = self.bytes_per_second();
        if rate == 0 {
            return 0.0;
        }
        byte_len as f64 / rate as f64 * 1000.0
    }
}

/// Склеить PCM фрагменты в один непрерывный буфер в переданном порядке
pub fn concat_pcm<'a, I>(fragments: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
    I::IntoIter: Clone,
{
    let iter = fragments.into_iter();
    let total: usize = iter.clone().map(|f| f.len()).sum();
    let mut combined = Vec::with_capacity(total);
    for fragment in iter {
        combined.extend_from_slice(fragment);
    }
    combined
}
