use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Формат вывода в консоль и в файл.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Многострочный человекочитаемый вывод
    Pretty,
    /// Однострочный вывод
    #[default]
    Compact,
    /// JSON, по объекту на строку
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень по умолчанию: trace, debug, info, warn, error
    pub level: String,
    /// Дополнительные директивы, например `"mlsaver::engine=debug"`
    pub directives: Vec<String>,
    pub format: LogFormat,
    pub console_enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    /// Файл лога; `None` отключает запись в файл
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::default(),
            console_enabled: true,
            with_ansi: true,
            with_target: true,
            file: None,
        }
    }
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    /// Переопределения из окружения: `MLSAVER_LOG_LEVEL`,
    /// `MLSAVER_LOG_FORMAT`, `MLSAVER_LOG_FILE`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("MLSAVER_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = env::var("MLSAVER_LOG_FORMAT")
            .ok()
            .and_then(|f| LogFormat::parse(&f))
        {
            self.format = format;
        }
        if let Ok(file) = env::var("MLSAVER_LOG_FILE") {
            self.file = if file.is_empty() {
                None
            } else {
                Some(PathBuf::from(file))
            };
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let level = self.level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(format!("invalid log level '{}'", self.level));
        }
        if let Some(file) = &self.file {
            if file.file_name().is_none() {
                return Err(format!("log file path '{}' has no file name", file.display()));
            }
        }
        Ok(())
    }

    /// Директива для `EnvFilter`: уровень, затем дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        let mut parts = vec![self.level.to_ascii_lowercase()];
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}
