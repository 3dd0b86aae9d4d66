//! Правило, решающее, какие слои сохраняются в архив.

use super::{memory::MEMORY_PROVIDER, EligibleLayer};

/// Пользовательское свойство слоя, исключающее его из сохранения.
pub const SKIP_PROPERTY: &str = "skipMemoryLayerSaver";

/// Правило отбора слоёв. Пересчитывается при каждом подключении, отключении,
/// сохранении и загрузке.
pub trait SavePolicy {
    fn is_saved_layer(
        &self,
        layer: &dyn EligibleLayer,
    ) -> bool;
}

/// Сохраняются слои провайдера `memory`, если у них не выставлено
/// свойство [`SKIP_PROPERTY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryProviderPolicy;

impl SavePolicy for MemoryProviderPolicy {
    fn is_saved_layer(
        &self,
        layer: &dyn EligibleLayer,
    ) -> bool {
        layer.provider() == MEMORY_PROVIDER
            && !layer
                .custom_property(SKIP_PROPERTY)
                .is_some_and(|v| is_truthy(&v))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
