use std::{cell::RefCell, fmt, rc::Rc};

use tracing::debug;

use crate::host::HostSettings;

/// Отключает вопрос хоста о сохранении временных слоёв, пока жив.
///
/// При создании запоминает прежнее значение настройки, при уничтожении
/// возвращает его.
pub struct PromptGuard {
    settings: Rc<RefCell<dyn HostSettings>>,
    backup: bool,
}

impl PromptGuard {
    pub fn engage(settings: Rc<RefCell<dyn HostSettings>>) -> Self {
        let backup = {
            let mut s = settings.borrow_mut();
            let backup = s.ask_to_save_memory_layers();
            s.set_ask_to_save_memory_layers(false);
            backup
        };
        debug!(backup, "Host memory layer prompt disabled");
        Self { settings, backup }
    }

    /// Значение, которое вернётся при уничтожении.
    pub fn backup(&self) -> bool {
        self.backup
    }
}

impl Drop for PromptGuard {
    fn drop(&mut self) {
        if let Ok(mut s) = self.settings.try_borrow_mut() {
            s.set_ask_to_save_memory_layers(self.backup);
            debug!(restored = self.backup, "Host memory layer prompt restored");
        }
    }
}

impl fmt::Debug for PromptGuard {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("PromptGuard")
            .field("backup", &self.backup)
            .finish()
    }
}
