use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Схема слоя в архиве несовместима с текущей схемой живого слоя.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("layer {layer}: archive has {archived}, live layer has {live}")]
pub struct SchemaMismatchError {
    pub layer: String,
    pub archived: String,
    pub live: String,
}

impl SchemaMismatchError {
    pub fn new(
        layer: impl Into<String>,
        archived: impl Into<String>,
        live: impl Into<String>,
    ) -> Self {
        Self {
            layer: layer.into(),
            archived: archived.into(),
            live: live.into(),
        }
    }
}

impl ErrorExt for SchemaMismatchError {
    fn status_code(&self) -> StatusCode {
        StatusCode::SchemaMismatch
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
