//! Модель данных слоя: геометрия, значения атрибутов, схема и объекты.
//!
//! Эти типы не зависят от хоста; живые слои хоста отдают и принимают их
//! через трейт [`crate::host::EligibleLayer`].

pub mod feature;
pub mod geometry;
pub mod value;

pub use feature::{Feature, Field, Schema};
pub use geometry::{Coord, Geometry, GeometryKind, Ring};
pub use value::{FieldType, Value};
