use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;

/// Владеет ресурсами логирования. Пока handle жив, файловый писатель
/// сбрасывает буфер в фоне; при уничтожении остаток дописывается.
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
    file: Option<PathBuf>,
}

impl LoggingHandle {
    pub fn new(
        file_guard: Option<WorkerGuard>,
        file: Option<PathBuf>,
    ) -> Self {
        Self { file_guard, file }
    }

    /// Путь файла лога, если запись в файл включена.
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Дописывает буфер файлового писателя и отключает его.
    pub fn shutdown(mut self) {
        tracing::debug!(file = ?self.file, "Logging shutdown");
        drop(self.file_guard.take());
    }
}

impl std::fmt::Debug for LoggingHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoggingHandle")
            .field("file", &self.file)
            .field("file_sink", &self.file_guard.is_some())
            .finish()
    }
}
