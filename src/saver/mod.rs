//! Отслеживание несохранённых изменений временных слоёв и привязка записи
//! и чтения архива к жизненному циклу проекта.

pub mod coordinator;
pub mod dirty;
pub mod info;
pub mod location;
pub mod prompt;

pub use coordinator::{LoadOutcome, MemoryLayerSaver, SaveOutcome, SaverBuilder, TITLE};
pub use dirty::{DirtyState, DirtyTracker};
pub use info::{info_message, layer_info, LayerInfo};
pub use location::{ArtifactLocation, ArtifactLocator};
pub use prompt::PromptGuard;
