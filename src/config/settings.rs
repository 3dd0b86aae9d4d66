use std::path::Path;

use config::{
    builder::{ConfigBuilder, DefaultState},
    Config, ConfigError, Environment, File,
};
use serde::{Deserialize, Serialize};

/// Настройки сохранятеля временных слоёв.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Суффикс файла-спутника: `<project>.<extension>`.
    pub extension: String,
    /// Имя вложения в контейнере проекта.
    pub attachment_name: String,
    /// Использовать вложения, если хост их поддерживает.
    pub use_attachments: bool,
    /// Сжимать полезную нагрузку записей zstd.
    pub compress_records: bool,
    /// Отключать вопрос хоста о сохранении временных слоёв на время работы.
    pub disable_host_prompt: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extension: "mldata".to_string(),
            attachment_name: "layers.mldata".to_string(),
            use_attachments: true,
            compress_records: false,
            disable_host_prompt: true,
        }
    }
}

impl Settings {
    /// Значения по умолчанию, затем переменные окружения с префиксом
    /// `MLSAVER_`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// Как [`Settings::load`], но между умолчаниями и окружением читается
    /// файл (toml, json, yaml, ini), если он существует.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path).required(false))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("extension", defaults.extension)?
            .set_default("attachment_name", defaults.attachment_name)?
            .set_default("use_attachments", defaults.use_attachments)?
            .set_default("compress_records", defaults.compress_records)?
            .set_default("disable_host_prompt", defaults.disable_host_prompt)
    }

    fn environment() -> Environment {
        Environment::with_prefix("MLSAVER").try_parsing(true)
    }

    /// Расширение без ведущей точки.
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}
