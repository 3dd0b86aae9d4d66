//! Интерфейсы хоста, с которыми работает сохранятель слоёв.
//!
//! Хост владеет проектом и слоями; сохранятель только читает и заменяет
//! содержимое слоёв и подписывается на события через [`Notifier`].
//! Всё выполняется в одном потоке событий хоста, поэтому слои разделяются
//! через `Rc<RefCell<..>>`.

pub mod events;
pub mod memory;
pub mod policy;

use std::{cell::RefCell, path::PathBuf, rc::Rc};

pub use events::{MutationKind, Notifier, ProjectEvent, ProjectListener, Subscription};
pub use memory::{InMemoryProject, MemoryLayer, MemorySettings, RecordingNotifier, MEMORY_PROVIDER};
pub use policy::{MemoryProviderPolicy, SavePolicy, SKIP_PROPERTY};
use tracing::{info, warn};

use crate::{
    error::HostError,
    layer::{Feature, GeometryKind, Schema},
};

/// Разделяемая ссылка на живой слой хоста.
pub type LayerRef = Rc<RefCell<dyn EligibleLayer>>;

/// Живой слой хоста.
pub trait EligibleLayer {
    /// Идентификатор, уникальный в пределах проекта.
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Имя провайдера данных слоя (`"memory"` для временных слоёв).
    fn provider(&self) -> &str;

    fn custom_property(
        &self,
        key: &str,
    ) -> Option<String>;

    fn geometry_kind(&self) -> GeometryKind;

    fn schema(&self) -> Schema;

    /// Объекты в собственном порядке обхода слоя.
    fn features(&self) -> Vec<Feature>;

    fn feature_count(&self) -> usize {
        self.features().len()
    }

    /// Атомарно заменяет все объекты слоя.
    fn replace_features(
        &mut self,
        features: Vec<Feature>,
    ) -> Result<(), HostError>;
}

/// Проект хоста.
pub trait Project {
    fn layers(&self) -> Vec<LayerRef>;

    /// Путь файла проекта; `None`, пока проект не сохранён.
    fn file_name(&self) -> Option<PathBuf>;

    fn is_dirty(&self) -> bool;

    fn set_dirty(
        &mut self,
        dirty: bool,
    );

    /// Умеет ли проект хранить вложенные файлы внутри своего контейнера.
    fn supports_attachments(&self) -> bool {
        false
    }

    /// Пути зарегистрированных вложений.
    fn attached_files(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Регистрирует вложение и возвращает путь, по которому его писать.
    fn create_attached_file(
        &mut self,
        name: &str,
    ) -> Result<PathBuf, HostError> {
        let _ = name;
        Err(HostError::AttachmentsUnsupported)
    }
}

/// Канал сообщений пользователю.
pub trait UserNotifier {
    fn warning(
        &self,
        title: &str,
        message: &str,
    );

    fn information(
        &self,
        title: &str,
        message: &str,
    );
}

/// Глобальные настройки хоста, которые сохранятель временно меняет.
pub trait HostSettings {
    /// Спрашивает ли хост о сохранении временных слоёв при закрытии.
    fn ask_to_save_memory_layers(&self) -> bool;

    fn set_ask_to_save_memory_layers(
        &mut self,
        ask: bool,
    );
}

/// Канал сообщений, который только пишет в лог.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn warning(
        &self,
        title: &str,
        message: &str,
    ) {
        warn!(title, "{}", message);
    }

    fn information(
        &self,
        title: &str,
        message: &str,
    ) {
        info!(title, "{}", message);
    }
}
