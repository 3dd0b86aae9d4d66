use std::fmt;

use tracing::debug;

/// Есть ли у временных слоёв изменения, не попавшие в архив.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyState {
    Clean,
    Dirty,
}

impl fmt::Display for DirtyState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Clean => "clean",
            Self::Dirty => "dirty",
        })
    }
}

/// Флаг несохранённых изменений. Живёт только в памяти процесса.
///
/// Переход в [`DirtyState::Clean`] допустим только после успешной
/// загрузки, успешного сохранения или очистки проекта.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyTracker {
    state: DirtyState,
}

impl DirtyTracker {
    /// Начальное состояние берётся из флага несохранённости проекта хоста.
    pub fn from_host(project_dirty: bool) -> Self {
        Self {
            state: if project_dirty {
                DirtyState::Dirty
            } else {
                DirtyState::Clean
            },
        }
    }

    pub fn state(&self) -> DirtyState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DirtyState::Dirty
    }

    pub fn mark_dirty(
        &mut self,
        reason: &str,
    ) {
        self.transition(DirtyState::Dirty, reason);
    }

    pub fn mark_clean(
        &mut self,
        reason: &str,
    ) {
        self.transition(DirtyState::Clean, reason);
    }

    fn transition(
        &mut self,
        to: DirtyState,
        reason: &str,
    ) {
        if self.state != to {
            debug!(from = %self.state, state = %to, reason, "Dirty state changed");
        }
        self.state = to;
    }
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::from_host(false)
    }
}
