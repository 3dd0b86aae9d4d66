//! Сопоставление схемы записи из архива со схемой живого слоя.
//!
//! Поля сопоставляются по имени и точному типу. Поля архива, которых нет в
//! живом слое, отбрасываются; поля живого слоя без пары или с другим типом
//! получают `Null`. Несовпадение типа геометрии слоя делает запись
//! неприменимой.

use mlsaver_error::SchemaMismatchError;

use super::mldata::LayerRecord;
use crate::layer::{Feature, GeometryKind, Schema, Value};

/// Что пришлось подправить при сопоставлении схем.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Поля архива, которых нет в живом слое.
    pub dropped: Vec<String>,
    /// Поля живого слоя, которых нет в архиве.
    pub missing: Vec<String>,
    /// Поля с совпадающим именем, но другим типом.
    pub retyped: Vec<String>,
}

impl Reconciliation {
    /// Схемы совпали полностью.
    pub fn is_exact(&self) -> bool {
        self.dropped.is_empty() && self.missing.is_empty() && self.retyped.is_empty()
    }
}

/// Приводит объекты записи к схеме живого слоя.
pub fn reconcile(
    record: &LayerRecord,
    live_kind: GeometryKind,
    live_schema: &Schema,
) -> Result<(Vec<Feature>, Reconciliation), SchemaMismatchError> {
    if record.geometry_kind != live_kind {
        return Err(SchemaMismatchError::new(
            record.id.clone(),
            format!("geometry {}", record.geometry_kind),
            format!("geometry {live_kind}"),
        ));
    }

    if &record.schema == live_schema {
        return Ok((record.features.clone(), Reconciliation::default()));
    }

    let mut report = Reconciliation::default();
    // для каждого живого поля индекс поля в архиве
    let mapping: Vec<Option<usize>> = live_schema
        .iter()
        .map(|field| match record.schema.index_of(&field.name) {
            Some(i) if record.schema.fields()[i].field_type == field.field_type => Some(i),
            Some(_) => {
                report.retyped.push(field.name.clone());
                None
            }
            None => {
                report.missing.push(field.name.clone());
                None
            }
        })
        .collect();
    report.dropped = record
        .schema
        .iter()
        .filter(|f| live_schema.index_of(&f.name).is_none())
        .map(|f| f.name.clone())
        .collect();

    let features = record
        .features
        .iter()
        .map(|feature| {
            let attributes = mapping
                .iter()
                .map(|slot| {
                    slot.and_then(|i| feature.attributes.get(i).cloned())
                        .unwrap_or(Value::Null)
                })
                .collect();
            Feature::new(feature.id, feature.geometry.clone(), attributes)
        })
        .collect();

    Ok((features, report))
}
