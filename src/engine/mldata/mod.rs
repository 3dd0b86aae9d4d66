//! Бинарный формат архива слоёв (`.mldata`).
//!
//! ## Структура файла
//!
//! ```text
//! magic "MLD" | version: u8 | flags: u8 | record_count: u32 | record*
//! ```
//!
//! Все числа big-endian. Каждая запись описывает один слой и защищена
//! собственной CRC32, поэтому повреждение одной записи не мешает прочитать
//! остальные.
//!
//! ## Модули
//!
//! - [`encode`]: сериализация геометрий и значений
//! - [`decode`]: десериализация геометрий и значений
//! - [`record`]: рамка и полезная нагрузка записи слоя
//! - [`compression`]: сжатие полезной нагрузки
//! - [`file`]: заголовок и версионирование
//! - [`tags`]: константы тегов

pub mod compression;
pub mod decode;
pub mod encode;
pub mod file;
pub mod record;
pub mod tags;

pub use compression::*;
pub use decode::{
    decode_geometry, decode_value, read_field_type, read_geometry, read_len, read_str,
    read_value,
};
pub use encode::*;
pub use file::*;
pub use record::*;
pub use tags::*;
