use std::{any::Any, fmt, io, path::PathBuf};

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Операция с файлом архива, при которой произошла ошибка.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
    Persist,
    CreateDir,
}

impl fmt::Display for IoOp {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Persist => write!(f, "replace"),
            Self::CreateDir => write!(f, "create directory for"),
        }
    }
}

/// Файл архива не удалось прочитать или записать. Фатальна для всей
/// операции загрузки/сохранения.
#[derive(Debug, Clone, Error)]
#[error("failed to {op} {}: {message}", .path.display())]
pub struct IoError {
    pub op: IoOp,
    pub path: PathBuf,
    pub kind: io::ErrorKind,
    pub message: String,
}

impl IoError {
    pub fn new(
        op: IoOp,
        path: impl Into<PathBuf>,
        source: &io::Error,
    ) -> Self {
        Self {
            op,
            path: path.into(),
            kind: source.kind(),
            message: source.to_string(),
        }
    }
}

impl ErrorExt for IoError {
    fn status_code(&self) -> StatusCode {
        match self.kind {
            io::ErrorKind::NotFound => StatusCode::NotFound,
            io::ErrorKind::PermissionDenied => StatusCode::PermissionDenied,
            io::ErrorKind::UnexpectedEof => StatusCode::UnexpectedEof,
            _ => StatusCode::Io,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_and_code() {
        let src = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = IoError::new(IoOp::Write, "/tmp/p.qgs.mldata", &src);

        assert_eq!(err.status_code(), StatusCode::PermissionDenied);
        let s = err.to_string();
        assert!(s.starts_with("failed to write /tmp/p.qgs.mldata"), "{s}");
        assert!(s.contains("denied"));
    }
}
