use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use mlsaver_error::{MlResult, ResultExt};
use tracing::debug;

use crate::{config::Settings, host::Project};

/// Где лежит архив слоёв проекта.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// Вложение внутри контейнера проекта.
    Attachment(PathBuf),
    /// Файл-спутник рядом с файлом проекта.
    Sidecar(PathBuf),
}

impl ArtifactLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Attachment(p) | Self::Sidecar(p) => p,
        }
    }

    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::Attachment(_))
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Attachment(p) | Self::Sidecar(p) => p,
        }
    }
}

/// Вычисляет место архива по состоянию проекта.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
    extension: String,
    attachment_name: String,
    use_attachments: bool,
}

impl ArtifactLocator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            extension: settings.extension().to_string(),
            attachment_name: settings.attachment_name.clone(),
            use_attachments: settings.use_attachments,
        }
    }

    /// `<project>.<extension>`: суффикс дописывается к полному имени файла
    /// проекта, а не заменяет его расширение.
    pub fn sidecar_path(
        &self,
        project_file: &Path,
    ) -> PathBuf {
        let mut name = OsString::from(project_file.as_os_str());
        name.push(".");
        name.push(&self.extension);
        PathBuf::from(name)
    }

    fn uses_attachments(
        &self,
        project: &dyn Project,
    ) -> bool {
        self.use_attachments && project.supports_attachments()
    }

    fn find_attachment(
        &self,
        project: &dyn Project,
    ) -> Option<PathBuf> {
        if !self.uses_attachments(project) {
            return None;
        }
        project.attached_files().into_iter().find(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(&self.attachment_name))
        })
    }

    /// Сначала зарегистрированное вложение, затем файл-спутник.
    /// `None`, пока у проекта нет имени файла.
    pub fn locate(
        &self,
        project: &dyn Project,
    ) -> Option<ArtifactLocation> {
        let project_file = project.file_name()?;
        if let Some(path) = self.find_attachment(project) {
            return Some(ArtifactLocation::Attachment(path));
        }
        Some(ArtifactLocation::Sidecar(self.sidecar_path(&project_file)))
    }

    /// Место записи. Если хост умеет вложения, а вложение ещё не
    /// зарегистрировано, регистрирует его.
    pub fn prepare_save_target(
        &self,
        project: &mut dyn Project,
    ) -> MlResult<Option<ArtifactLocation>> {
        if project.file_name().is_none() {
            return Ok(None);
        }
        if self.uses_attachments(project) && self.find_attachment(project).is_none() {
            let path = project
                .create_attached_file(&self.attachment_name)
                .with_context(|| format!("registering attachment {}", self.attachment_name))?;
            debug!(path = %path.display(), "Attachment registered");
        }
        Ok(self.locate(project))
    }
}
