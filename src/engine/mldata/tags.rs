//! Однобайтовые теги бинарного формата архива слоёв.
//!
//! Теги геометрии совпадают с дискриминантами
//! [`GeometryKind`](crate::layer::GeometryKind), тег `0x00` означает пустую
//! геометрию. Теги значений и теги типов полей используют одну нумерацию:
//! тег типа поля `Integer` равен тегу значения `Integer`.

/// Пустая геометрия (null)
pub const GEOM_EMPTY: u8 = 0x00;
/// Точка
pub const GEOM_POINT: u8 = 0x01;
/// Линия
pub const GEOM_LINESTRING: u8 = 0x02;
/// Полигон (список колец)
pub const GEOM_POLYGON: u8 = 0x03;
/// Мультиточка
pub const GEOM_MULTIPOINT: u8 = 0x04;
/// Мультилиния
pub const GEOM_MULTILINESTRING: u8 = 0x05;
/// Мультиполигон
pub const GEOM_MULTIPOLYGON: u8 = 0x06;

/// Null
pub const TAG_NULL: u8 = 0x00;
/// Целое число (i64)
pub const TAG_INT: u8 = 0x01;
/// Число с плавающей точкой (f64)
pub const TAG_REAL: u8 = 0x02;
/// Строка UTF-8 (u32 длина + байты)
pub const TAG_TEXT: u8 = 0x03;
/// Логическое значение (u8)
pub const TAG_BOOL: u8 = 0x04;
/// Дата: i32 дней от 0001-01-01
pub const TAG_DATE: u8 = 0x05;
/// Время суток: u32 секунд от полуночи + u32 наносекунд
pub const TAG_TIME: u8 = 0x06;
/// Дата и время: i64 секунд unix + u32 наносекунд
pub const TAG_DATETIME: u8 = 0x07;

/// Максимальная длина строки в архиве (имя слоя, имя поля, текст).
pub const MAX_STR_LEN: u64 = 64 * 1024 * 1024;
