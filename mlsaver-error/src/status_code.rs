use std::fmt;

use num_enum::TryFromPrimitive;

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки данных и схемы слоя
/// - 5xxx: Хранилище (архив слоёв)
/// - 6xxx: Ввод-вывод
/// - 8xxx: Формат архива
///
/// `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unsupported = 1001,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,

    // === 2xxx: Ошибки данных ===
    NotFound = 2000,
    AlreadyExists = 2001,
    TypeError = 2002,
    InvalidValue = 2003,
    InvalidData = 2004,
    SchemaMismatch = 2005,
    UnsupportedType = 2006,

    // === 5xxx: Хранилище ===
    CorruptedData = 5002,
    CompressionFailed = 5005,
    HostRejected = 5006,

    // === 6xxx: Ввод-вывод ===
    Io = 6000,
    PermissionDenied = 6001,
    UnexpectedEof = 6002,

    // === 8xxx: Формат ===
    InvalidMagic = 8000,
    UnsupportedVersion = 8001,
    InvalidTag = 8002,
    InvalidUtf8 = 8003,
    SizeLimit = 8004,
    ChecksumMismatch = 8005,
}

/// Уровень, с которым ошибку стоит писать в лог.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::NotFound | Self::AlreadyExists => LogLevel::Debug,
            Self::InvalidArgs | Self::InvalidValue | Self::SchemaMismatch => LogLevel::Info,
            Self::Internal
            | Self::Unknown
            | Self::Unexpected
            | Self::PermissionDenied
            | Self::Io => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
