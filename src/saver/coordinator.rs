//! Координатор жизненного цикла: следит за изменениями сохраняемых слоёв и
//! решает, когда писать и читать архив.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    path::PathBuf,
    rc::{Rc, Weak},
};

use mlsaver_error::{LogLevel, MlResult, ResultExt, StackError};
use tracing::{debug, error, info, warn};

use super::{
    dirty::{DirtyState, DirtyTracker},
    info::{info_message, layer_info, LayerInfo},
    location::ArtifactLocator,
    prompt::PromptGuard,
};
use crate::{
    config::Settings,
    engine::{apply, ApplyReport, ArchiveReader, ArchiveWriter, WriteSummary},
    host::{
        HostSettings, LayerRef, LogNotifier, MemoryProviderPolicy, MutationKind, Notifier, Project,
        ProjectEvent, ProjectListener, SavePolicy, Subscription, UserNotifier,
    },
};

/// Заголовок сообщений пользователю.
pub const TITLE: &str = "Memory Layer Saver";
const LOAD_ERROR_TITLE: &str = "Error reloading memory layers";
const SAVE_ERROR_TITLE: &str = "Error saving memory layers";

/// Итог запроса на сохранение.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Изменений нет, архив не трогали.
    Skipped,
    /// У проекта ещё нет файла, писать некуда. Состояние остаётся `Dirty`.
    NoLocation,
    /// Сохраняемых слоёв нет и прежнего архива нет.
    NothingToSave,
    Written(WriteSummary),
}

/// Итог запроса на загрузку.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Архива для проекта нет: слои раньше не сохранялись.
    NoArtifact,
    /// В проекте нет сохраняемых слоёв, архив не читали.
    NoEligibleLayers,
    Loaded { path: PathBuf, report: ApplyReport },
}

/// Сохранятель временных слоёв.
///
/// Пока значение живо, он подписан на события проекта и на изменения
/// каждого сохраняемого слоя. Уничтожение (или [`MemoryLayerSaver::detach`])
/// снимает все подписки и возвращает настройку подсказки хоста.
pub struct MemoryLayerSaver {
    core: Rc<RefCell<SaverCore>>,
    _project: Subscription,
    _prompt: Option<PromptGuard>,
}

/// Параметры подключения [`MemoryLayerSaver`].
pub struct SaverBuilder {
    settings: Settings,
    policy: Box<dyn SavePolicy>,
    user: Rc<dyn UserNotifier>,
    host_settings: Option<Rc<RefCell<dyn HostSettings>>>,
}

impl SaverBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            policy: Box::new(MemoryProviderPolicy),
            user: Rc::new(LogNotifier),
            host_settings: None,
        }
    }

    pub fn policy(
        mut self,
        policy: impl SavePolicy + 'static,
    ) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn user_notifier(
        mut self,
        user: Rc<dyn UserNotifier>,
    ) -> Self {
        self.user = user;
        self
    }

    /// Настройки хоста, в которых отключается вопрос о сохранении
    /// временных слоёв (если это разрешено [`Settings::disable_host_prompt`]).
    pub fn host_settings(
        mut self,
        settings: Rc<RefCell<dyn HostSettings>>,
    ) -> Self {
        self.host_settings = Some(settings);
        self
    }

    /// Подписывается на события `notifier` и подключает уже существующие
    /// сохраняемые слои. Начальное состояние берётся из
    /// [`Project::is_dirty`].
    pub fn attach(
        self,
        notifier: &Notifier,
        project: &dyn Project,
    ) -> MemoryLayerSaver {
        let prompt = match self.host_settings {
            Some(hs) if self.settings.disable_host_prompt => Some(PromptGuard::engage(hs)),
            _ => None,
        };
        let writer = ArchiveWriter::new().compressed(self.settings.compress_records);
        let locator = ArtifactLocator::new(&self.settings);
        let dirty = DirtyTracker::from_host(project.is_dirty());

        let core = Rc::new_cyclic(|me| {
            RefCell::new(SaverCore {
                me: me.clone(),
                notifier: notifier.clone(),
                policy: self.policy,
                user: self.user,
                locator,
                writer,
                dirty,
                layers: HashMap::new(),
            })
        });
        core.borrow_mut().connect_existing(project);

        let weak = Rc::downgrade(&core);
        let listener: Weak<RefCell<dyn ProjectListener>> = weak;
        let subscription = notifier.subscribe(listener);
        info!(
            layers = core.borrow().layers.len(),
            state = %core.borrow().dirty.state(),
            "Memory layer saver attached"
        );

        MemoryLayerSaver {
            core,
            _project: subscription,
            _prompt: prompt,
        }
    }
}

impl MemoryLayerSaver {
    /// Подключение с правилом [`MemoryProviderPolicy`] и сообщениями в лог.
    pub fn attach(
        notifier: &Notifier,
        project: &dyn Project,
        settings: Settings,
    ) -> Self {
        SaverBuilder::new(settings).attach(notifier, project)
    }

    pub fn builder(settings: Settings) -> SaverBuilder {
        SaverBuilder::new(settings)
    }

    /// Снимает подписки и восстанавливает настройки хоста.
    pub fn detach(self) {
        debug!("Memory layer saver detached");
    }

    pub fn state(&self) -> DirtyState {
        self.core.borrow().dirty.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.core.borrow().dirty.is_dirty()
    }

    /// Число слоёв, на изменения которых есть подписка.
    pub fn connected_layers(&self) -> usize {
        self.core.borrow().layers.len()
    }

    /// Записывает архив, если есть несохранённые изменения.
    pub fn save_data(
        &self,
        project: &mut dyn Project,
    ) -> MlResult<SaveOutcome> {
        self.core.borrow_mut().save(project)
    }

    /// Читает архив проекта и заменяет им объекты сохраняемых слоёв.
    pub fn load_data(
        &self,
        project: &mut dyn Project,
    ) -> MlResult<LoadOutcome> {
        self.core.borrow_mut().load(project)
    }

    pub fn layer_info(
        &self,
        project: &dyn Project,
    ) -> Vec<LayerInfo> {
        let core = self.core.borrow();
        layer_info(&project.layers(), core.policy.as_ref())
    }

    /// Показывает пользователю список слоёв, которые попадут в архив.
    pub fn show_info(
        &self,
        project: &dyn Project,
    ) {
        let message = info_message(&self.layer_info(project));
        self.core.borrow().user.information(TITLE, &message);
    }
}

impl fmt::Debug for MemoryLayerSaver {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.core.try_borrow() {
            Ok(core) => f
                .debug_struct("MemoryLayerSaver")
                .field("state", &core.dirty.state())
                .field("layers", &core.layers.len())
                .field("prompt", &self._prompt)
                .finish(),
            Err(_) => f.write_str("MemoryLayerSaver { <busy> }"),
        }
    }
}

struct SaverCore {
    me: Weak<RefCell<SaverCore>>,
    notifier: Notifier,
    policy: Box<dyn SavePolicy>,
    user: Rc<dyn UserNotifier>,
    locator: ArtifactLocator,
    writer: ArchiveWriter,
    dirty: DirtyTracker,
    /// Подписки на изменения сохраняемых слоёв, по идентификатору слоя.
    layers: HashMap<String, Subscription>,
}

impl SaverCore {
    fn is_saved(
        &self,
        layer: &LayerRef,
    ) -> bool {
        self.policy.is_saved_layer(&*layer.borrow())
    }

    fn eligible_layers(
        &self,
        project: &dyn Project,
    ) -> Vec<LayerRef> {
        project
            .layers()
            .into_iter()
            .filter(|l| self.is_saved(l))
            .collect()
    }

    fn connect_existing(
        &mut self,
        project: &dyn Project,
    ) {
        for layer in self.eligible_layers(project) {
            self.connect(&layer);
        }
    }

    /// Подписка на изменения слоя. `false`, если слой уже подключён.
    fn connect(
        &mut self,
        layer: &LayerRef,
    ) -> bool {
        let id = layer.borrow().id().to_string();
        if self.layers.contains_key(&id) {
            return false;
        }
        let listener: Weak<RefCell<dyn ProjectListener>> = self.me.clone();
        let subscription = self.notifier.subscribe_layer(&id, listener);
        debug!(layer = %id, "Layer connected");
        self.layers.insert(id, subscription);
        true
    }

    fn disconnect(
        &mut self,
        layer_id: &str,
    ) -> bool {
        let removed = self.layers.remove(layer_id).is_some();
        if removed {
            debug!(layer = %layer_id, "Layer disconnected");
        }
        removed
    }

    fn save(
        &mut self,
        project: &mut dyn Project,
    ) -> MlResult<SaveOutcome> {
        if !self.dirty.is_dirty() {
            debug!(state = %self.dirty.state(), "No changes, save skipped");
            return Ok(SaveOutcome::Skipped);
        }

        let Some(target) = self.locator.prepare_save_target(project)? else {
            debug!("Project has no file name, nothing saved");
            return Ok(SaveOutcome::NoLocation);
        };

        let layers = self.eligible_layers(project);
        if layers.is_empty() && !target.path().exists() {
            debug!(path = %target.path().display(), "No memory layers to save");
            self.dirty.mark_clean("nothing to save");
            return Ok(SaveOutcome::NothingToSave);
        }

        info!(
            path = %target.path().display(),
            records = layers.len(),
            attachment = target.is_attachment(),
            "Saving memory layers"
        );
        let summary = self
            .writer
            .write(&layers, target.path())
            .context("saving memory layers")?;
        self.dirty.mark_clean("saved");
        Ok(SaveOutcome::Written(summary))
    }

    fn load(
        &mut self,
        project: &mut dyn Project,
    ) -> MlResult<LoadOutcome> {
        let location = match self.locator.locate(project) {
            Some(loc) if loc.path().exists() => loc,
            _ => {
                debug!("No memory layer archive for project");
                self.dirty.mark_clean("no archive");
                return Ok(LoadOutcome::NoArtifact);
            }
        };

        let layers = self.eligible_layers(project);
        if layers.is_empty() {
            debug!(path = %location.path().display(), "No memory layers to load");
            self.dirty.mark_clean("no memory layers");
            return Ok(LoadOutcome::NoEligibleLayers);
        }

        info!(path = %location.path().display(), records = layers.len(), "Loading memory layers");
        let archive = ArchiveReader::read(location.path()).context("loading memory layers")?;
        let report = apply(&archive, &layers);
        info!(
            path = %location.path().display(),
            records = report.applied(),
            warnings = report.warnings().count(),
            "Memory layers loaded"
        );
        self.dirty.mark_clean("loaded");

        Ok(LoadOutcome::Loaded {
            path: location.into_path(),
            report,
        })
    }

    fn report_failure(
        &self,
        title: &str,
        err: &StackError,
    ) {
        match err.log_level() {
            LogLevel::Error => error!(error = %err, status = ?err.status_code(), "{title}"),
            LogLevel::Warn => warn!(error = %err, status = ?err.status_code(), "{title}"),
            LogLevel::Info | LogLevel::Debug => {
                info!(error = %err, status = ?err.status_code(), "{title}")
            }
        }
        self.user.warning(title, &err.user_message());
    }
}

impl ProjectListener for SaverCore {
    fn on_layer_added(
        &mut self,
        _project: &mut dyn Project,
        layer: &LayerRef,
    ) {
        if self.is_saved(layer) && self.connect(layer) {
            self.dirty.mark_dirty("layer added");
        }
    }

    fn on_layer_removed(
        &mut self,
        _project: &mut dyn Project,
        layer_id: &str,
    ) {
        if self.disconnect(layer_id) {
            self.dirty.mark_dirty("layer removed");
        }
    }

    fn on_layer_mutated(
        &mut self,
        project: &mut dyn Project,
        layer_id: &str,
        kind: MutationKind,
    ) {
        if !self.layers.contains_key(layer_id) {
            return;
        }
        self.dirty.mark_dirty(&kind.to_string());
        project.set_dirty(true);
    }

    fn on_project_event(
        &mut self,
        project: &mut dyn Project,
        event: ProjectEvent,
    ) {
        match event {
            ProjectEvent::ReadProject => match self.load(project) {
                Ok(LoadOutcome::Loaded { report, .. }) => {
                    if let Some(message) = report.warning_message() {
                        warn!(warnings = report.warnings().count(), "Some memory layers were not restored");
                        self.user.warning(LOAD_ERROR_TITLE, &message);
                    }
                }
                Ok(_) => {}
                Err(e) => self.report_failure(LOAD_ERROR_TITLE, &e),
            },
            ProjectEvent::WriteProject => {
                if let Err(e) = self.save(project) {
                    self.report_failure(SAVE_ERROR_TITLE, &e);
                }
            }
            ProjectEvent::Cleared => {
                self.layers.clear();
                self.dirty.mark_clean("project cleared");
            }
        }
    }
}
