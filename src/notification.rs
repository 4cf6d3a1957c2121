//! Модуль для реализации системы уведомлений
//!
//! Этот модуль предоставляет конкретные реализации наблюдателей для
//! системы прогресса библиотеки newscast-tts.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::{ProcessStep, ProgressInfo, ProgressObserver};

/// Наблюдатель, выводящий информацию о прогрессе в консоль
pub struct ConsoleProgressObserver {
    prefix: Option<String>,
}

impl ConsoleProgressObserver {
    /// Создать новый экземпляр ConsoleProgressObserver
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Создать новый экземпляр ConsoleProgressObserver с префиксом
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn render(&self, progress: &ProgressInfo) -> String {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let details = progress
            .details
            .as_deref()
            .map(|d| format!(", {}", d))
            .unwrap_or_default();
        format!(
            "{}[Прогресс] {}: {:.0}% (всего {:.1}%){}",
            prefix, progress.step, progress.step_progress, progress.total_progress, details
        )
    }
}

impl Default for ConsoleProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        eprintln!("{}", self.render(&progress));
    }
}

/// Наблюдатель, сохраняющий информацию о прогрессе в памяти
#[derive(Clone, Default)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    /// Создать новый экземпляр MemoryProgressObserver
    pub fn new() -> Self {
        Self::default()
    }

    /// Получить историю обновлений прогресса
    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().clone()
    }

    /// Очистить историю обновлений прогресса
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        self.history.lock().push(progress);
    }
}

/// Наблюдатель, вызывающий функцию обратного вызова при обновлении прогресса
pub struct CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    callback: F,
}

impl<F> CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    /// Создать новый экземпляр CallbackProgressObserver
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressObserver for CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    fn on_progress_update(&self, progress: ProgressInfo) {
        (self.callback)(progress);
    }
}

/// Наблюдатель, передающий целый процент синтеза речи в функцию обратного вызова.
///
/// Срабатывает только на отчеты этапа синтеза, которые несут детали
/// (отчет после каждого фрагмента), так что смена этапа не дает ложного 0%.
pub struct PercentCallbackObserver {
    callback: Box<dyn Fn(u32) + Send + Sync>,
}

impl PercentCallbackObserver {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl ProgressObserver for PercentCallbackObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        if progress.step == ProcessStep::SpeechGeneration.as_str() && progress.details.is_some() {
            (self.callback)(progress.step_progress.round() as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_observer_format() {
        let observer = ConsoleProgressObserver::with_prefix("[Test] ");
        let line = observer.render(&ProgressInfo::new(
            "Генерация речи",
            50.0,
            47.5,
            Some("фрагмент 1/2".to_string()),
        ));
        assert_eq!(
            line,
            "[Test] [Прогресс] Генерация речи: 50% (всего 47.5%), фрагмент 1/2"
        );
        observer.on_progress_update(ProgressInfo::new("Step", 10.0, 1.0, None));
    }

    #[test]
    fn test_memory_observer() {
        let observer = MemoryProgressObserver::new();

        observer.on_progress_update(ProgressInfo::new("Step 1", 50.0, 25.0, None));
        observer.on_progress_update(ProgressInfo::new("Step 1", 100.0, 50.0, None));
        observer.on_progress_update(ProgressInfo::new("Step 2", 50.0, 75.0, None));

        let history = observer.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].step, "Step 1");
        assert_eq!(history[1].step_progress, 100.0);
        assert_eq!(history[2].total_progress, 75.0);

        observer.clear_history();
        assert!(observer.history().is_empty());
    }

    #[test]
    fn test_memory_observer_clones_share_history() {
        let observer = MemoryProgressObserver::new();
        let boxed: Box<dyn ProgressObserver> = Box::new(observer.clone());
        boxed.on_progress_update(ProgressInfo::new("Step", 1.0, 1.0, None));
        assert_eq!(observer.history().len(), 1);
    }

    #[test]
    fn test_callback_observer() {
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let observer = CallbackProgressObserver::new(move |_| {
            *counter_clone.lock() += 1;
        });

        observer.on_progress_update(ProgressInfo::new("Step 1", 50.0, 25.0, None));
        observer.on_progress_update(ProgressInfo::new("Step 2", 0.0, 50.0, None));

        assert_eq!(*counter.lock(), 2);
    }

    #[test]
    fn test_percent_observer_filters_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer = PercentCallbackObserver::new(move |p| sink.lock().push(p));

        let speech = ProcessStep::SpeechGeneration.as_str();
        observer.on_progress_update(ProgressInfo::new(speech, 0.0, 5.0, None));
        observer.on_progress_update(ProgressInfo::new(speech, 33.3, 33.0, Some("1/3".into())));
        observer.on_progress_update(ProgressInfo::new(speech, 66.7, 61.0, Some("2/3".into())));
        observer.on_progress_update(ProgressInfo::new(
            ProcessStep::SubtitleTiming.as_str(),
            100.0,
            100.0,
            Some("done".into()),
        ));

        assert_eq!(*seen.lock(), vec![33, 67]);
    }
}
