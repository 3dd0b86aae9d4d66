//! Жизненный цикл сохранятеля: флаг изменений, сохранение при записи
//! проекта, загрузка при чтении, очистка, вложения.

use std::{cell::RefCell, fs, path::PathBuf, rc::Rc};

use mlsaver::{
    host::{MemorySettings, RecordingNotifier},
    saver::TITLE,
    DirtyState, EligibleLayer, Field, FieldType, Geometry, GeometryKind, InMemoryProject,
    LoadOutcome, MemoryLayer, MemoryLayerSaver, MutationKind, Notifier, Project, SaveOutcome,
    Schema, Settings, Value,
};
use rstest::rstest;
use tempfile::{tempdir, TempDir};

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("num", FieldType::Integer),
        Field::new("label", FieldType::Text),
    ])
}

fn empty(id: &str) -> Rc<RefCell<MemoryLayer>> {
    Rc::new(RefCell::new(MemoryLayer::new(
        id,
        "pts",
        GeometryKind::Point,
        schema(),
    )))
}

fn pts(id: &str) -> Rc<RefCell<MemoryLayer>> {
    let mut layer = MemoryLayer::new(id, "pts", GeometryKind::Point, schema());
    layer.add_feature(
        Geometry::point(1.0, 2.0),
        vec![Value::Integer(1), Value::Text("a".into())],
    );
    Rc::new(RefCell::new(layer))
}

struct Fixture {
    dir: TempDir,
    notifier: Notifier,
    project: InMemoryProject,
    layer: Rc<RefCell<MemoryLayer>>,
    saver: MemoryLayerSaver,
}

impl Fixture {
    /// Проект с файлом и одним временным слоем, сохранятель в `Clean`.
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let notifier = Notifier::new();
        let mut project = InMemoryProject::with_file(dir.path().join("map.qgs"));
        let layer = pts("pts_1");
        project.add_layer(&notifier, layer.clone());
        project.set_dirty(false);
        let saver = MemoryLayerSaver::attach(&notifier, &project, Settings::default());
        Self {
            dir,
            notifier,
            project,
            layer,
            saver,
        }
    }

    fn sidecar(&self) -> PathBuf {
        self.dir.path().join("map.qgs.mldata")
    }
}

#[rstest]
#[case::attribute_added(MutationKind::AttributeAdded)]
#[case::attribute_deleted(MutationKind::AttributeDeleted)]
#[case::features_added(MutationKind::FeaturesAdded)]
#[case::features_removed(MutationKind::FeaturesRemoved)]
#[case::attribute_values_changed(MutationKind::AttributeValuesChanged)]
#[case::geometry_changed(MutationKind::GeometryChanged)]
fn test_every_mutation_dirties(#[case] kind: MutationKind) {
    let mut fx = Fixture::new();
    assert_eq!(fx.saver.state(), DirtyState::Clean);

    fx.project.commit_changes(&fx.notifier, "pts_1", kind);

    assert_eq!(fx.saver.state(), DirtyState::Dirty);
    assert!(fx.project.is_dirty());
}

#[test]
fn test_all_mutation_kinds_covered() {
    assert_eq!(MutationKind::ALL.len(), 6);
}

#[test]
fn test_idempotent_save() {
    let mut fx = Fixture::new();
    fx.project.commit_changes(&fx.notifier, "pts_1", MutationKind::FeaturesAdded);

    let first = fx.saver.save_data(&mut fx.project).unwrap();
    assert!(matches!(first, SaveOutcome::Written(_)));
    assert_eq!(fx.saver.state(), DirtyState::Clean);

    // подменяем содержимое: повторное сохранение не должно его тронуть
    fs::write(fx.sidecar(), b"marker").unwrap();
    let second = fx.saver.save_data(&mut fx.project).unwrap();
    assert_eq!(second, SaveOutcome::Skipped);
    assert_eq!(fs::read(fx.sidecar()).unwrap(), b"marker");
}

#[test]
fn test_clean_save_then_mutation_writes_once() {
    let mut fx = Fixture::new();
    fx.project.write(&fx.notifier);
    assert!(!fx.sidecar().exists());

    fx.layer
        .borrow_mut()
        .add_feature(Geometry::point(5.0, 5.0), vec![Value::Integer(2), Value::Null]);
    fx.project.commit_changes(&fx.notifier, "pts_1", MutationKind::FeaturesAdded);
    fx.project.write(&fx.notifier);

    assert!(fx.sidecar().exists());
    assert_eq!(fx.saver.state(), DirtyState::Clean);
    let written = fs::read(fx.sidecar()).unwrap();

    fx.project.write(&fx.notifier);
    assert_eq!(fs::read(fx.sidecar()).unwrap(), written);
}

#[rstest]
#[case::from_clean(false)]
#[case::from_dirty(true)]
fn test_clear_yields_clean(#[case] dirty_first: bool) {
    let mut fx = Fixture::new();
    if dirty_first {
        fx.project.commit_changes(&fx.notifier, "pts_1", MutationKind::GeometryChanged);
    }
    fx.project.clear(&fx.notifier);

    assert_eq!(fx.saver.state(), DirtyState::Clean);
    assert_eq!(fx.saver.connected_layers(), 0);
    assert_eq!(fx.notifier.layer_listener_count("pts_1"), 0);
}

#[test]
fn test_add_and_remove_dirty() {
    let mut fx = Fixture::new();
    fx.project.add_layer(&fx.notifier, pts("pts_2"));
    assert!(fx.saver.is_dirty());

    fx.saver.save_data(&mut fx.project).unwrap();
    assert!(!fx.saver.is_dirty());

    fx.project.remove_layer(&fx.notifier, "pts_2");
    assert!(fx.saver.is_dirty());
    assert_eq!(fx.notifier.layer_listener_count("pts_2"), 0);
}

/// Полный цикл: сохранить, закрыть, открыть заново и получить те же объекты.
#[test]
fn test_reopen_restores_layers() {
    let fx = {
        let mut fx = Fixture::new();
        fx.project.commit_changes(&fx.notifier, "pts_1", MutationKind::FeaturesAdded);
        fx.project.write(&fx.notifier);
        fx
    };
    let expected = fx.layer.borrow().features();
    let project_file = fx.project.file_name().unwrap();

    let notifier = Notifier::new();
    let user = RecordingNotifier::new();
    let mut reopened = InMemoryProject::new();
    let saver = MemoryLayerSaver::builder(Settings::default())
        .user_notifier(user.clone())
        .attach(&notifier, &reopened);
    reopened.set_file_name(Some(project_file));
    let fresh = empty("pts_1");
    reopened.add_layer(&notifier, fresh.clone());
    assert!(saver.is_dirty());

    reopened.finish_read(&notifier);

    assert_eq!(saver.state(), DirtyState::Clean);
    assert_eq!(fresh.borrow().features(), expected);
    assert!(user.warnings().is_empty());
}

#[test]
fn test_load_without_artifact_is_not_an_error() {
    let mut fx = Fixture::new();
    fx.project.commit_changes(&fx.notifier, "pts_1", MutationKind::FeaturesAdded);
    let outcome = fx.saver.load_data(&mut fx.project).unwrap();
    assert!(matches!(outcome, LoadOutcome::NoArtifact));
    assert!(!fx.saver.is_dirty());
}

#[test]
fn test_partial_load_warns_user() {
    let dir = tempdir().unwrap();
    let project_file = dir.path().join("map.qgs");
    let notifier = Notifier::new();

    {
        let mut project = InMemoryProject::with_file(&project_file);
        project.add_layer(&notifier, pts("a"));
        project.add_layer(&notifier, pts("b"));
        let saver = MemoryLayerSaver::attach(&notifier, &project, Settings::default());
        assert!(matches!(
            saver.save_data(&mut project).unwrap(),
            SaveOutcome::Written(_)
        ));
    }

    // портим полезную нагрузку первой записи ("a")
    let sidecar = dir.path().join("map.qgs.mldata");
    let mut bytes = fs::read(&sidecar).unwrap();
    bytes[9 + 4 + 1 + 8 + 1] ^= 0xFF;
    fs::write(&sidecar, bytes).unwrap();

    let user = RecordingNotifier::new();
    let mut project = InMemoryProject::with_file(&project_file);
    let saver = MemoryLayerSaver::builder(Settings::default())
        .user_notifier(user.clone())
        .attach(&notifier, &project);
    let a = empty("a");
    let b = empty("b");
    project.add_layer(&notifier, a.clone());
    project.add_layer(&notifier, b.clone());
    project.finish_read(&notifier);

    assert_eq!(a.borrow().feature_count(), 0);
    assert_eq!(b.borrow().feature_count(), 1);
    let warnings = user.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].1.contains("Layer a"), "{:?}", warnings);
    assert_eq!(saver.state(), DirtyState::Clean);
}

#[test]
fn test_attachment_preferred_over_sidecar() {
    let dir = tempdir().unwrap();
    let notifier = Notifier::new();
    let mut project = InMemoryProject::with_file(dir.path().join("map.qgz"))
        .with_attachments(dir.path().join("attachments"));
    fs::create_dir_all(dir.path().join("attachments")).unwrap();
    project.add_layer(&notifier, pts("pts_1"));
    let saver = MemoryLayerSaver::attach(&notifier, &project, Settings::default());

    project.write(&notifier);

    let attachment = dir.path().join("attachments").join("layers.mldata");
    assert!(attachment.exists());
    assert!(!dir.path().join("map.qgz.mldata").exists());
    assert_eq!(project.attached_files(), vec![attachment]);
    assert!(!saver.is_dirty());
}

#[test]
fn test_write_failure_is_reported_not_raised() {
    let dir = tempdir().unwrap();
    let notifier = Notifier::new();
    let user = RecordingNotifier::new();
    let missing = dir.path().join("no").join("such").join("map.qgs");
    let mut project = InMemoryProject::with_file(&missing);
    project.add_layer(&notifier, pts("pts_1"));
    let saver = MemoryLayerSaver::builder(Settings::default())
        .user_notifier(user.clone())
        .attach(&notifier, &project);

    project.write(&notifier);

    assert_eq!(user.warnings().len(), 1);
    assert!(saver.is_dirty());
}

#[test]
fn test_prompt_setting_restored_on_detach() {
    let notifier = Notifier::new();
    let project = InMemoryProject::new();
    let host = Rc::new(RefCell::new(MemorySettings::default()));

    let saver = MemoryLayerSaver::builder(Settings::default())
        .host_settings(host.clone())
        .attach(&notifier, &project);
    assert!(!host.borrow().ask_to_save_memory_layers);

    saver.detach();
    assert!(host.borrow().ask_to_save_memory_layers);
}

#[test]
fn test_prompt_untouched_when_disabled() {
    let notifier = Notifier::new();
    let project = InMemoryProject::new();
    let host = Rc::new(RefCell::new(MemorySettings::default()));
    let settings = Settings {
        disable_host_prompt: false,
        ..Settings::default()
    };

    let _saver = MemoryLayerSaver::builder(settings)
        .host_settings(host.clone())
        .attach(&notifier, &project);
    assert!(host.borrow().ask_to_save_memory_layers);
}

#[test]
fn test_show_info_lists_layers() {
    let notifier = Notifier::new();
    let user = RecordingNotifier::new();
    let mut project = InMemoryProject::new();
    let saver = MemoryLayerSaver::builder(Settings::default())
        .user_notifier(user.clone())
        .attach(&notifier, &project);

    saver.show_info(&project);
    project.add_layer(&notifier, pts("pts_1"));
    saver.show_info(&project);

    let infos = user.infos();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].0, TITLE);
    assert!(infos[0].1.contains("no memory layers"));
    assert!(infos[1].1.contains("- pts (1 feature)"));
}
