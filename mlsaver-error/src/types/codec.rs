use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибка кодека архива слоёв: повреждённые байты, неизвестные теги,
/// несовпадение контрольной суммы.
///
/// На чтении ошибка локальна для одной записи слоя, на записи фатальна для
/// всего архива.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Неверный magic number в заголовке
    InvalidMagic { expected: [u8; 3], got: [u8; 3] },

    /// Неподдерживаемая версия формата
    UnsupportedVersion { found: u8, supported: Vec<u8> },

    /// Неизвестный тег геометрии, значения или типа поля
    InvalidTag {
        what: &'static str,
        tag: u8,
        offset: Option<u64>,
    },

    /// Неожиданный конец данных
    UnexpectedEof {
        context: String,
        offset: Option<u64>,
    },

    /// CRC полезной нагрузки записи не совпадает
    ChecksumMismatch {
        layer: String,
        computed: u32,
        recorded: u32,
    },

    /// Строка в архиве не является корректным UTF-8
    InvalidUtf8 { context: String },

    /// Превышен лимит размера
    SizeLimit { what: String, size: u64, limit: u64 },

    /// Значение не соответствует объявленному типу поля
    TypeMismatch {
        field: Option<String>,
        expected: String,
        got: String,
    },

    /// Число атрибутов объекта не совпадает с числом полей схемы
    FieldCountMismatch {
        feature: i64,
        expected: usize,
        got: usize,
    },

    /// Идентификатор слоя встречается в архиве дважды
    DuplicateLayer { id: String },

    /// Дата/время вне представимого диапазона
    InvalidTimestamp { what: &'static str, raw: String },

    /// После разбора записи остались лишние байты
    TrailingBytes { layer: String, count: u64 },

    /// Ошибка распаковки/сжатия блока записи
    Compression { reason: String },
}

impl CodecError {
    /// Добавляет имя поля к ошибке несоответствия типа.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        if let Self::TypeMismatch { field, .. } = &mut self {
            *field = Some(name.into());
        }
        self
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::InvalidMagic { expected, got } => {
                write!(
                    f,
                    "invalid magic number: expected {expected:?}, got {got:?}"
                )
            }
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    f,
                    "unsupported archive version {found} (supported: {supported:?})"
                )
            }
            Self::InvalidTag { what, tag, offset } => {
                write!(f, "invalid {what} tag 0x{tag:02X}")?;
                write_offset(f, *offset)
            }
            Self::UnexpectedEof { context, offset } => {
                write!(f, "unexpected end of data: {context}")?;
                write_offset(f, *offset)
            }
            Self::ChecksumMismatch {
                layer,
                computed,
                recorded,
            } => write!(
                f,
                "checksum mismatch in layer {layer}: computed 0x{computed:08X}, recorded 0x{recorded:08X}"
            ),
            Self::InvalidUtf8 { context } => write!(f, "invalid UTF-8 in {context}"),
            Self::SizeLimit { what, size, limit } => {
                write!(f, "{what} size {size} exceeds limit {limit}")
            }
            Self::TypeMismatch {
                field,
                expected,
                got,
            } => {
                write!(f, "value of type {got} does not match declared type {expected}")?;
                if let Some(name) = field {
                    write!(f, " (field '{name}')")?;
                }
                Ok(())
            }
            Self::FieldCountMismatch {
                feature,
                expected,
                got,
            } => write!(
                f,
                "feature {feature} has {got} attributes, schema has {expected} fields"
            ),
            Self::DuplicateLayer { id } => write!(f, "duplicate layer id '{id}' in archive"),
            Self::InvalidTimestamp { what, raw } => write!(f, "invalid {what}: {raw}"),
            Self::TrailingBytes { layer, count } => {
                write!(f, "{count} trailing bytes after layer record {layer}")
            }
            Self::Compression { reason } => write!(f, "record block compression error: {reason}"),
        }
    }
}

fn write_offset(
    f: &mut std::fmt::Formatter<'_>,
    offset: Option<u64>,
) -> std::fmt::Result {
    if let Some(o) = offset {
        write!(f, " [offset: 0x{o:X}]")?;
    }
    Ok(())
}

impl std::error::Error for CodecError {}

impl ErrorExt for CodecError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidMagic { .. } => StatusCode::InvalidMagic,
            Self::UnsupportedVersion { .. } => StatusCode::UnsupportedVersion,
            Self::InvalidTag { .. } => StatusCode::InvalidTag,
            Self::UnexpectedEof { .. } => StatusCode::UnexpectedEof,
            Self::ChecksumMismatch { .. } => StatusCode::ChecksumMismatch,
            Self::InvalidUtf8 { .. } => StatusCode::InvalidUtf8,
            Self::SizeLimit { .. } => StatusCode::SizeLimit,
            Self::TypeMismatch { .. } => StatusCode::TypeError,
            Self::FieldCountMismatch { .. } => StatusCode::InvalidData,
            Self::DuplicateLayer { .. } => StatusCode::AlreadyExists,
            Self::InvalidTimestamp { .. } => StatusCode::InvalidValue,
            Self::TrailingBytes { .. } => StatusCode::CorruptedData,
            Self::Compression { .. } => StatusCode::CompressionFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
