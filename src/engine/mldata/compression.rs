//! Сжатие полезной нагрузки записей слоя с помощью ZSTD.
//!
//! Флаг сжатия хранится в заголовке архива и действует на все записи.
//! Контрольная сумма записи считается по сжатым байтам, так что повреждение
//! обнаруживается до распаковки.

use std::io::Read;

use mlsaver_error::{CodecError, MlResult};
use zstd::stream::{encode_all, read::Decoder};

/// Уровень сжатия: баланс между скоростью и размером.
const COMPRESSION_LEVEL: i32 = 3;

/// Сжимает блок байтов.
pub fn compress_block(data: &[u8]) -> MlResult<Vec<u8>> {
    encode_all(data, COMPRESSION_LEVEL).map_err(|e| {
        CodecError::Compression {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Распаковывает блок, сжатый [`compress_block`].
///
/// Результат длиннее `limit` байт отвергается без полной распаковки.
pub fn decompress_block(
    data: &[u8],
    limit: u64,
) -> MlResult<Vec<u8>> {
    let decoder = Decoder::new(data).map_err(compression_error)?;
    let mut out = Vec::new();
    decoder
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(compression_error)?;
    if out.len() as u64 > limit {
        return Err(CodecError::SizeLimit {
            what: "decompressed record payload".to_string(),
            size: out.len() as u64,
            limit,
        }
        .into());
    }
    Ok(out)
}

fn compression_error(e: std::io::Error) -> CodecError {
    CodecError::Compression {
        reason: e.to_string(),
    }
}
