use std::any::Any;

use mlsaver_error::{ErrorExt, StatusCode};
use thiserror::Error;

/// Отказ хоста выполнить запрос сохранятеля слоёв.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Layer {layer} rejected feature replacement: {reason}")]
    ReplaceRejected { layer: String, reason: String },

    #[error("Project does not support embedded attachments")]
    AttachmentsUnsupported,

    #[error("Failed to register attachment {name}: {reason}")]
    Attachment { name: String, reason: String },
}

impl ErrorExt for HostError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ReplaceRejected { .. } | Self::Attachment { .. } => StatusCode::HostRejected,
            Self::AttachmentsUnsupported => StatusCode::Unsupported,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
