//! Пример использования системы прогресса
//!
//! Генерирует короткий выпуск с ключами из GEMINI_API_KEYS и выводит прогресс
//! в консоль, смену этапов и процент синтеза через обратные вызовы.

use std::sync::Arc;

use newscast_tts::config::{BioSettings, NewscastConfig, WaitDuration};
use newscast_tts::notification::{CallbackProgressObserver, ConsoleProgressObserver};
use newscast_tts::progress::{DefaultProgressReporter, ProgressReporter};
use newscast_tts::store::MemoryStore;
use newscast_tts::{GenerateSpeechParams, NewscastTts};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    newscast_tts::logger::init_logger();

    let script = "Good evening. Stocks rose today as markets closed higher. \
                  In other news, the city council approved a new transit line.";
    let settings = BioSettings {
        wait_duration: WaitDuration::Long,
        ..BioSettings::default()
    };

    println!("Пример 1: наблюдатель прогресса в консоли");
    let mut reporter = DefaultProgressReporter::new();
    reporter.add_observer(Box::new(ConsoleProgressObserver::with_prefix("[demo] ")));

    let mut tts = NewscastTts::from_env(NewscastConfig::default(), Arc::new(MemoryStore::new()))?;
    tts.set_progress_reporter(Box::new(reporter));

    let package = tts.generate_package(script, &settings).await?;
    let paths = package.save(std::env::temp_dir(), "newscast-demo")?;
    println!("Сохранено: {}", paths.zip.display());

    println!("Пример 2: наблюдатель с функцией обратного вызова");
    tts.add_observer(Box::new(CallbackProgressObserver::new(|info| {
        if info.step_progress == 0.0 {
            println!("начат этап: {}", info.step);
        }
    })));
    tts.generate(script, &settings).await?;

    println!("Пример 3: процент синтеза через обратный вызов");
    let params = GenerateSpeechParams::new(script, settings)
        .on_progress(|percent| println!("синтез: {}%", percent));
    let speech = tts.generate_speech(params).await?;
    println!(
        "Получено {} байт аудио, {:.1} с",
        speech.audio_data.len(),
        speech.total_duration_ms() / 1000.0
    );

    Ok(())
}
