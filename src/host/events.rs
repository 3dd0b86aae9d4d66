//! Источник событий хоста и подписки на него.
//!
//! Слушатели хранятся как `Weak`: реестр не продлевает им жизнь. Подписка
//! снимается, когда [`Subscription`] уничтожается. Перед вызовом
//! слушателей реестр освобождается, поэтому обработчик может подписываться
//! и отписываться прямо во время рассылки.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use tracing::warn;

use super::{LayerRef, Project};

/// Вид изменения слоя, о котором хост сообщает после фиксации правки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    AttributeAdded,
    AttributeDeleted,
    FeaturesAdded,
    FeaturesRemoved,
    AttributeValuesChanged,
    GeometryChanged,
}

impl MutationKind {
    pub const ALL: [MutationKind; 6] = [
        MutationKind::AttributeAdded,
        MutationKind::AttributeDeleted,
        MutationKind::FeaturesAdded,
        MutationKind::FeaturesRemoved,
        MutationKind::AttributeValuesChanged,
        MutationKind::GeometryChanged,
    ];
}

impl fmt::Display for MutationKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::AttributeAdded => "attribute added",
            Self::AttributeDeleted => "attribute deleted",
            Self::FeaturesAdded => "features added",
            Self::FeaturesRemoved => "features removed",
            Self::AttributeValuesChanged => "attribute values changed",
            Self::GeometryChanged => "geometry changed",
        };
        f.write_str(name)
    }
}

/// События жизненного цикла проекта.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectEvent {
    /// Проект прочитан, его слои уже добавлены.
    ReadProject,
    /// Проект записывается на диск.
    WriteProject,
    /// Проект очищен, все слои удалены.
    Cleared,
}

/// Обработчик событий хоста.
pub trait ProjectListener {
    fn on_layer_added(
        &mut self,
        project: &mut dyn Project,
        layer: &LayerRef,
    ) {
        let _ = (project, layer);
    }

    fn on_layer_removed(
        &mut self,
        project: &mut dyn Project,
        layer_id: &str,
    ) {
        let _ = (project, layer_id);
    }

    /// Вызывается только для подписок на конкретный слой.
    fn on_layer_mutated(
        &mut self,
        project: &mut dyn Project,
        layer_id: &str,
        kind: MutationKind,
    ) {
        let _ = (project, layer_id, kind);
    }

    fn on_project_event(
        &mut self,
        project: &mut dyn Project,
        event: ProjectEvent,
    ) {
        let _ = (project, event);
    }
}

type ListenerRef = Rc<RefCell<dyn ProjectListener>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Project,
    Layer(String),
}

struct Entry {
    id: u64,
    scope: Scope,
    listener: Weak<RefCell<dyn ProjectListener>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Источник событий проекта и его слоёв.
#[derive(Clone, Default)]
pub struct Notifier {
    registry: Rc<RefCell<Registry>>,
}

/// Регистрация слушателя. Уничтожение снимает подписку.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Подписка на события проекта: добавление и удаление слоёв, чтение,
    /// запись и очистка проекта.
    pub fn subscribe(
        &self,
        listener: Weak<RefCell<dyn ProjectListener>>,
    ) -> Subscription {
        self.register(Scope::Project, listener)
    }

    /// Подписка на изменения одного слоя.
    pub fn subscribe_layer(
        &self,
        layer_id: &str,
        listener: Weak<RefCell<dyn ProjectListener>>,
    ) -> Subscription {
        self.register(Scope::Layer(layer_id.to_string()), listener)
    }

    fn register(
        &self,
        scope: Scope,
        listener: Weak<RefCell<dyn ProjectListener>>,
    ) -> Subscription {
        let mut reg = self.registry.borrow_mut();
        reg.next_id += 1;
        let id = reg.next_id;
        reg.entries.push(Entry {
            id,
            scope,
            listener,
        });
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Число живых подписок на события проекта.
    pub fn listener_count(&self) -> usize {
        self.targets(&Scope::Project).len()
    }

    /// Число живых подписок на изменения слоя.
    pub fn layer_listener_count(
        &self,
        layer_id: &str,
    ) -> usize {
        self.targets(&Scope::Layer(layer_id.to_string())).len()
    }

    fn targets(
        &self,
        scope: &Scope,
    ) -> Vec<ListenerRef> {
        let reg = self.registry.borrow();
        reg.entries
            .iter()
            .filter(|e| &e.scope == scope)
            .filter_map(|e| e.listener.upgrade())
            .collect()
    }

    pub fn layer_added(
        &self,
        project: &mut dyn Project,
        layer: &LayerRef,
    ) {
        for target in self.targets(&Scope::Project) {
            if let Some(mut listener) = acquire(&target) {
                listener.on_layer_added(project, layer);
            }
        }
    }

    pub fn layer_removed(
        &self,
        project: &mut dyn Project,
        layer_id: &str,
    ) {
        for target in self.targets(&Scope::Project) {
            if let Some(mut listener) = acquire(&target) {
                listener.on_layer_removed(project, layer_id);
            }
        }
    }

    pub fn layer_mutated(
        &self,
        project: &mut dyn Project,
        layer_id: &str,
        kind: MutationKind,
    ) {
        for target in self.targets(&Scope::Layer(layer_id.to_string())) {
            if let Some(mut listener) = acquire(&target) {
                listener.on_layer_mutated(project, layer_id, kind);
            }
        }
    }

    pub fn project_event(
        &self,
        project: &mut dyn Project,
        event: ProjectEvent,
    ) {
        for target in self.targets(&Scope::Project) {
            if let Some(mut listener) = acquire(&target) {
                listener.on_project_event(project, event);
            }
        }
    }
}

/// Занимает слушателя. Слушатель, уже занятый выше по стеку (событие
/// порождено его же обработчиком), пропускает повторное событие.
fn acquire(target: &ListenerRef) -> Option<std::cell::RefMut<'_, dyn ProjectListener>> {
    match target.try_borrow_mut() {
        Ok(listener) => Some(listener),
        Err(_) => {
            warn!("Skipping re-entrant notification for a busy listener");
            None
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut reg) = registry.try_borrow_mut() {
                reg.entries.retain(|e| e.id != self.id);
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let reg = self.registry.borrow();
        f.debug_struct("Notifier")
            .field("subscriptions", &reg.entries.len())
            .finish()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
