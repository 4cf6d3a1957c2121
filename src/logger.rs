use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Фильтр по умолчанию, если RUST_LOG не задан
pub const DEFAULT_FILTER: &str = "warn,newscast_tts=info";

/// Инициализировать логирование в stderr.
///
/// Повторный вызов ничего не делает.
pub fn init_logger() {
    init_logger_with(DEFAULT_FILTER);
}

/// Инициализировать логирование с заданным фильтром по умолчанию
pub fn init_logger_with(default_filter: &str) {
    let env = Env::default().filter_or("RUST_LOG", default_filter);

    let mut builder = Builder::from_env(env);

    // Явно подавляем шумные модули HTTP стека
    builder
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("hyper_util", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        .filter_module("mio", LevelFilter::Error)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
