//! Хранение слоёв на диске.
//!
//! - `mldata`: бинарный формат архива и кодеки записей.
//! - `archive`: запись и чтение архива целиком, применение к живым слоям.
//! - `reconcile`: сопоставление схемы записи со схемой живого слоя.

pub mod archive;
pub mod mldata;
pub mod reconcile;

pub use archive::*;
pub use mldata::{
    decode_geometry, decode_layer, decode_value, encode_geometry, encode_layer, encode_value,
    LayerRecord,
};
pub use reconcile::*;
