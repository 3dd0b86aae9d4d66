//! Хост в памяти: слои, проект, настройки и канал сообщений.
//!
//! Используется тестами и встраивающими приложениями, у которых нет
//! собственной модели проекта.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

use super::{
    EligibleLayer, HostSettings, LayerRef, MutationKind, Notifier, Project, ProjectEvent,
    UserNotifier,
};
use crate::{
    error::HostError,
    layer::{Feature, Field, Geometry, GeometryKind, Schema, Value},
};

/// Провайдер временных слоёв.
pub const MEMORY_PROVIDER: &str = "memory";

/// Слой, данные которого живут только в памяти.
#[derive(Debug, Clone)]
pub struct MemoryLayer {
    id: String,
    name: String,
    provider: String,
    geometry_kind: GeometryKind,
    schema: Schema,
    features: Vec<Feature>,
    properties: HashMap<String, String>,
    next_fid: i64,
    read_only: bool,
}

impl MemoryLayer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        geometry_kind: GeometryKind,
        schema: Schema,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: MEMORY_PROVIDER.to_string(),
            geometry_kind,
            schema,
            features: Vec::new(),
            properties: HashMap::new(),
            next_fid: 1,
            read_only: false,
        }
    }

    pub fn with_provider(
        mut self,
        provider: impl Into<String>,
    ) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn set_custom_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.properties.insert(key.into(), value.into());
    }

    /// Слой только для чтения отвергает замену объектов.
    pub fn set_read_only(
        &mut self,
        read_only: bool,
    ) {
        self.read_only = read_only;
    }

    /// Добавляет объект и возвращает присвоенный идентификатор.
    ///
    /// Счётчик насыщается на `i64::MAX`.
    pub fn add_feature(
        &mut self,
        geometry: Geometry,
        attributes: Vec<Value>,
    ) -> i64 {
        let fid = self.next_fid;
        self.next_fid = self.next_fid.saturating_add(1);
        self.features.push(Feature::new(fid, geometry, attributes));
        fid
    }

    pub fn remove_feature(
        &mut self,
        fid: i64,
    ) -> Option<Feature> {
        let pos = self.features.iter().position(|f| f.id == fid)?;
        Some(self.features.remove(pos))
    }

    pub fn feature_mut(
        &mut self,
        fid: i64,
    ) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id == fid)
    }

    /// Добавляет поле; у существующих объектов оно получает `Null`.
    pub fn add_attribute(
        &mut self,
        field: Field,
    ) {
        self.schema.push(field);
        for feature in &mut self.features {
            feature.attributes.push(Value::Null);
        }
    }

    pub fn delete_attribute(
        &mut self,
        name: &str,
    ) -> bool {
        let Some(index) = self.schema.index_of(name) else {
            return false;
        };
        let fields = self
            .schema
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, f)| f.clone())
            .collect();
        self.schema = Schema::new(fields);
        for feature in &mut self.features {
            if index < feature.attributes.len() {
                feature.attributes.remove(index);
            }
        }
        true
    }
}

impl EligibleLayer for MemoryLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn custom_property(
        &self,
        key: &str,
    ) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn geometry_kind(&self) -> GeometryKind {
        self.geometry_kind
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn features(&self) -> Vec<Feature> {
        self.features.clone()
    }

    fn feature_count(&self) -> usize {
        self.features.len()
    }

    fn replace_features(
        &mut self,
        features: Vec<Feature>,
    ) -> Result<(), HostError> {
        if self.read_only {
            return Err(HostError::ReplaceRejected {
                layer: self.id.clone(),
                reason: "layer is read-only".to_string(),
            });
        }
        self.next_fid = features
            .iter()
            .map(|f| f.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.features = features;
        Ok(())
    }
}

/// Проект в памяти.
///
/// Методы, меняющие состав слоёв или жизненный цикл проекта, принимают
/// [`Notifier`] и рассылают через него соответствующие события.
#[derive(Default)]
pub struct InMemoryProject {
    file_name: Option<PathBuf>,
    layers: Vec<LayerRef>,
    dirty: bool,
    attachment_dir: Option<PathBuf>,
    attachments: Vec<PathBuf>,
}

impl InMemoryProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: Some(path.into()),
            ..Self::default()
        }
    }

    /// Включает вложения; файлы вложений создаются в `dir`.
    pub fn with_attachments(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.attachment_dir = Some(dir.into());
        self
    }

    pub fn set_file_name(
        &mut self,
        path: Option<PathBuf>,
    ) {
        self.file_name = path;
    }

    pub fn layer(
        &self,
        id: &str,
    ) -> Option<LayerRef> {
        self.layers.iter().find(|l| l.borrow().id() == id).cloned()
    }

    pub fn add_layer(
        &mut self,
        notifier: &Notifier,
        layer: LayerRef,
    ) {
        self.layers.push(layer.clone());
        self.dirty = true;
        notifier.layer_added(self, &layer);
    }

    pub fn remove_layer(
        &mut self,
        notifier: &Notifier,
        id: &str,
    ) -> Option<LayerRef> {
        let pos = self.layers.iter().position(|l| l.borrow().id() == id)?;
        let layer = self.layers.remove(pos);
        self.dirty = true;
        notifier.layer_removed(self, id);
        Some(layer)
    }

    /// Сообщает об изменении слоя после фиксации правки.
    pub fn commit_changes(
        &mut self,
        notifier: &Notifier,
        id: &str,
        kind: MutationKind,
    ) {
        notifier.layer_mutated(self, id, kind);
    }

    /// Проект прочитан: слои уже добавлены, подписчики загружают данные.
    pub fn finish_read(
        &mut self,
        notifier: &Notifier,
    ) {
        notifier.project_event(self, ProjectEvent::ReadProject);
        self.dirty = false;
    }

    /// Запись проекта. После рассылки проект считается сохранённым.
    pub fn write(
        &mut self,
        notifier: &Notifier,
    ) {
        notifier.project_event(self, ProjectEvent::WriteProject);
        self.dirty = false;
    }

    /// Удаляет все слои и сбрасывает проект.
    pub fn clear(
        &mut self,
        notifier: &Notifier,
    ) {
        self.layers.clear();
        self.attachments.clear();
        self.file_name = None;
        notifier.project_event(self, ProjectEvent::Cleared);
        self.dirty = false;
    }
}

impl fmt::Debug for InMemoryProject {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let layers: Vec<String> = self
            .layers
            .iter()
            .map(|l| l.borrow().id().to_string())
            .collect();
        f.debug_struct("InMemoryProject")
            .field("file_name", &self.file_name)
            .field("layers", &layers)
            .field("dirty", &self.dirty)
            .field("attachments", &self.attachments)
            .finish()
    }
}

impl Project for InMemoryProject {
    fn layers(&self) -> Vec<LayerRef> {
        self.layers.clone()
    }

    fn file_name(&self) -> Option<PathBuf> {
        self.file_name.clone()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(
        &mut self,
        dirty: bool,
    ) {
        self.dirty = dirty;
    }

    fn supports_attachments(&self) -> bool {
        self.attachment_dir.is_some()
    }

    fn attached_files(&self) -> Vec<PathBuf> {
        self.attachments.clone()
    }

    fn create_attached_file(
        &mut self,
        name: &str,
    ) -> Result<PathBuf, HostError> {
        let dir = self
            .attachment_dir
            .as_deref()
            .ok_or(HostError::AttachmentsUnsupported)?;
        if name.is_empty() || Path::new(name).components().count() != 1 {
            return Err(HostError::Attachment {
                name: name.to_string(),
                reason: "attachment name must be a plain file name".to_string(),
            });
        }
        let path = dir.join(name);
        if !self.attachments.contains(&path) {
            self.attachments.push(path.clone());
        }
        Ok(path)
    }
}

/// Настройки хоста в памяти.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySettings {
    pub ask_to_save_memory_layers: bool,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            ask_to_save_memory_layers: true,
        }
    }
}

impl HostSettings for MemorySettings {
    fn ask_to_save_memory_layers(&self) -> bool {
        self.ask_to_save_memory_layers
    }

    fn set_ask_to_save_memory_layers(
        &mut self,
        ask: bool,
    ) {
        self.ask_to_save_memory_layers = ask;
    }
}

/// Канал сообщений, запоминающий всё отправленное.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    warnings: RefCell<Vec<(String, String)>>,
    infos: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn warnings(&self) -> Vec<(String, String)> {
        self.warnings.borrow().clone()
    }

    pub fn infos(&self) -> Vec<(String, String)> {
        self.infos.borrow().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn warning(
        &self,
        title: &str,
        message: &str,
    ) {
        self.warnings
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }

    fn information(
        &self,
        title: &str,
        message: &str,
    ) {
        self.infos
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}
