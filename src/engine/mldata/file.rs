use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use mlsaver_error::{CodecError, MlResult};

use super::decode::eof;

/// «Магическое» начало файла: ASCII-буквы «MLD».
pub const FILE_MAGIC: &[u8; 3] = b"MLD";

/// Полезные нагрузки записей сжаты zstd.
pub const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Известные флаги заголовка. Неизвестные биты при чтении отвергаются.
pub const KNOWN_FLAGS: u8 = FLAG_COMPRESSED;

/// Поддерживаемые версии формата архива.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    V1 = 1,
}

impl FormatVersion {
    pub const CURRENT: FormatVersion = FormatVersion::V1;

    pub fn supported() -> Vec<u8> {
        vec![FormatVersion::V1 as u8]
    }
}

impl TryFrom<u8> for FormatVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FormatVersion::V1),
            other => Err(CodecError::UnsupportedVersion {
                found: other,
                supported: FormatVersion::supported(),
            }),
        }
    }
}

/// Текущая версия формата архива, как число.
pub const ARCHIVE_VERSION: u8 = FormatVersion::V1 as u8;

/// Заголовок архива: `magic | version | flags | record_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub version: FormatVersion,
    pub flags: u8,
    pub record_count: u32,
}

/// Размер заголовка в байтах.
pub const HEADER_LEN: usize = 3 + 1 + 1 + 4;

impl ArchiveHeader {
    pub fn new(
        record_count: u32,
        compressed: bool,
    ) -> Self {
        Self {
            version: FormatVersion::CURRENT,
            flags: if compressed { FLAG_COMPRESSED } else { 0 },
            record_count,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    /// Записывает заголовок в поток.
    pub fn write_to<W: Write>(
        &self,
        w: &mut W,
    ) -> MlResult<()> {
        w.write_all(FILE_MAGIC)?;
        w.write_u8(self.version as u8)?;
        w.write_u8(self.flags)?;
        w.write_u32::<BigEndian>(self.record_count)?;
        Ok(())
    }

    /// Читает и проверяет заголовок. Любая ошибка здесь фатальна для всего
    /// архива.
    pub fn read_from<R: Read>(r: &mut R) -> MlResult<Self> {
        let mut magic = [0u8; 3];
        r.read_exact(&mut magic).map_err(eof("archive magic"))?;
        if &magic != FILE_MAGIC {
            return Err(CodecError::InvalidMagic {
                expected: *FILE_MAGIC,
                got: magic,
            }
            .into());
        }
        let version = FormatVersion::try_from(r.read_u8().map_err(eof("archive version"))?)?;
        let flags = Self::validate_flags(r.read_u8().map_err(eof("archive flags"))?)?;
        let record_count = r.read_u32::<BigEndian>().map_err(eof("record count"))?;
        Ok(Self {
            version,
            flags,
            record_count,
        })
    }

    /// Проверяет флаги, прочитанные из файла.
    pub fn validate_flags(flags: u8) -> MlResult<u8> {
        if flags & !KNOWN_FLAGS != 0 {
            return Err(CodecError::InvalidTag {
                what: "header flags",
                tag: flags,
                offset: Some(4),
            }
            .into());
        }
        Ok(flags)
    }
}
