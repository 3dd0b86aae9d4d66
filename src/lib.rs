//! Сохранение временных (in-memory) слоёв проекта в архив `.mldata` рядом
//! с файлом проекта и их восстановление при повторном открытии.

/// Настройки сохранятеля.
pub mod config;
/// Формат архива, запись, чтение и применение записей к слоям.
pub mod engine;
/// Ошибки хоста.
pub mod error;
/// Интерфейсы хоста: слои, проект, события, правило отбора.
pub mod host;
/// Модель данных слоя: геометрия, значения, схема, объекты.
pub mod layer;
/// Логирование (форматы, фильтры, файловый вывод).
pub mod logging;
/// Координатор жизненного цикла и флаг несохранённых изменений.
pub mod saver;

// -----------------------------------------------------------------------------
//  Часто используемые публичные типы
// -----------------------------------------------------------------------------

pub use config::Settings;
pub use engine::{
    apply, decode_geometry, decode_layer, decode_value, encode_geometry, encode_layer,
    encode_value, ApplyReport, Archive, ArchiveEntry, ArchiveReader, ArchiveWriter, LayerRecord,
    RecordOutcome, Reconciliation, WriteSummary,
};
pub use error::HostError;
pub use host::{
    EligibleLayer, HostSettings, InMemoryProject, LayerRef, MemoryLayer, MemoryProviderPolicy,
    MutationKind, Notifier, Project, ProjectEvent, ProjectListener, SavePolicy, Subscription,
    UserNotifier,
};
pub use layer::{Coord, Feature, Field, FieldType, Geometry, GeometryKind, Ring, Schema, Value};
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
pub use mlsaver_error::{MlResult, StackError, StatusCode};
pub use saver::{DirtyState, LoadOutcome, MemoryLayerSaver, SaveOutcome};
