//! Генераторы для property-based тестирования кодека архива.
//!
//! Числа с плавающей точкой только конечные: `Value` и `Geometry`
//! сравниваются через `PartialEq`, а NaN не равен сам себе.

use std::ops::Range;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use mlsaver::{
    Coord, Feature, Field, FieldType, Geometry, GeometryKind, LayerRecord, MemoryLayer, Schema,
    Value,
};
use proptest::{collection::vec, prelude::*, string::string_regex};

/// Размеры коллекций: от пустых до умеренно больших.
const SMALL: Range<usize> = 0..6;
const MEDIUM: Range<usize> = 0..40;

fn component_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(-0.0),
        -180.0f64..180.0,
        prop::num::f64::NORMAL,
    ]
}

pub fn coord_strategy() -> impl Strategy<Value = Coord> {
    (component_strategy(), component_strategy()).prop_map(|(x, y)| Coord::new(x, y))
}

fn ring_strategy() -> impl Strategy<Value = Vec<Coord>> {
    vec(coord_strategy(), MEDIUM)
}

/// Геометрия указанного типа или пустая.
pub fn geometry_of(kind: GeometryKind) -> BoxedStrategy<Geometry> {
    let body = match kind {
        GeometryKind::NoGeometry => return Just(Geometry::Empty).boxed(),
        GeometryKind::Point => coord_strategy().prop_map(Geometry::Point).boxed(),
        GeometryKind::LineString => ring_strategy().prop_map(Geometry::LineString).boxed(),
        GeometryKind::Polygon => vec(ring_strategy(), SMALL)
            .prop_map(Geometry::Polygon)
            .boxed(),
        GeometryKind::MultiPoint => ring_strategy().prop_map(Geometry::MultiPoint).boxed(),
        GeometryKind::MultiLineString => vec(ring_strategy(), SMALL)
            .prop_map(Geometry::MultiLineString)
            .boxed(),
        GeometryKind::MultiPolygon => vec(vec(ring_strategy(), SMALL), SMALL)
            .prop_map(Geometry::MultiPolygon)
            .boxed(),
    };
    prop_oneof![1 => Just(Geometry::Empty), 4 => body].boxed()
}

pub fn geometry_kind_strategy() -> impl Strategy<Value = GeometryKind> {
    prop_oneof![
        Just(GeometryKind::NoGeometry),
        Just(GeometryKind::Point),
        Just(GeometryKind::LineString),
        Just(GeometryKind::Polygon),
        Just(GeometryKind::MultiPoint),
        Just(GeometryKind::MultiLineString),
        Just(GeometryKind::MultiPolygon),
    ]
}

pub fn geometry_strategy() -> impl Strategy<Value = Geometry> {
    geometry_kind_strategy().prop_flat_map(geometry_of)
}

pub fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Integer),
        Just(FieldType::Real),
        Just(FieldType::Text),
        Just(FieldType::Boolean),
        Just(FieldType::Date),
        Just(FieldType::Time),
        Just(FieldType::DateTime),
    ]
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        string_regex("[a-zA-Z0-9 ]{1,16}").unwrap(),
        // raw string лучше для unicode-диапазонов
        string_regex(r"[\u{00}-\u{1F}\u{400}-\u{4FF}\u{1F600}-\u{1F64F}]{1,24}").unwrap(),
    ]
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (-700_000i32..3_000_000).prop_map(|days| {
        NaiveDate::from_num_days_from_ce_opt(days).expect("days within chrono range")
    })
}

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..86_400, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).expect("valid time of day")
    })
}

fn datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (-60_000_000_000i64..250_000_000_000, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        DateTime::from_timestamp(secs, nanos)
            .expect("timestamp within chrono range")
            .naive_utc()
    })
}

/// Значение объявленного типа или `Null`.
pub fn value_of(ty: &FieldType) -> BoxedStrategy<Value> {
    let body = match ty {
        FieldType::Integer => prop_oneof![
            Just(i64::MIN),
            Just(i64::MAX),
            Just(0),
            any::<i64>(),
            // целые за пределами точности f64
            (1i64 << 53..i64::MAX),
        ]
        .prop_map(Value::Integer)
        .boxed(),
        FieldType::Real => prop_oneof![
            Just(0.0),
            Just(f64::MIN_POSITIVE),
            Just(f64::MAX),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL,
        ]
        .prop_map(Value::Real)
        .boxed(),
        FieldType::Text => text_strategy().prop_map(Value::Text).boxed(),
        FieldType::Boolean => any::<bool>().prop_map(Value::Boolean).boxed(),
        FieldType::Date => date_strategy().prop_map(Value::Date).boxed(),
        FieldType::Time => time_strategy().prop_map(Value::Time).boxed(),
        FieldType::DateTime => datetime_strategy().prop_map(Value::DateTime).boxed(),
        FieldType::Other(_) => return Just(Value::Null).boxed(),
    };
    prop_oneof![1 => Just(Value::Null), 5 => body].boxed()
}

/// Пара (тип, значение этого типа).
pub fn typed_value_strategy() -> impl Strategy<Value = (FieldType, Value)> {
    field_type_strategy().prop_flat_map(|ty| {
        let values = value_of(&ty);
        (Just(ty), values)
    })
}

pub fn schema_strategy() -> impl Strategy<Value = Schema> {
    vec(field_type_strategy(), SMALL).prop_map(|types| {
        Schema::new(
            types
                .into_iter()
                .enumerate()
                .map(|(i, ty)| Field::new(format!("f{i}"), ty))
                .collect(),
        )
    })
}

fn feature_strategy(
    kind: GeometryKind,
    schema: &Schema,
) -> BoxedStrategy<(Geometry, Vec<Value>)> {
    let attrs: Vec<BoxedStrategy<Value>> = schema.iter().map(|f| value_of(&f.field_type)).collect();
    (geometry_of(kind), attrs).boxed()
}

/// Временный слой с произвольными схемой, типом геометрии и объектами.
pub fn layer_strategy() -> impl Strategy<Value = MemoryLayer> {
    (geometry_kind_strategy(), schema_strategy()).prop_flat_map(|(kind, schema)| {
        let features = vec(feature_strategy(kind, &schema), MEDIUM);
        (Just(kind), Just(schema), features).prop_map(|(kind, schema, features)| {
            let mut layer = MemoryLayer::new("layer", "generated", kind, schema);
            for (geometry, attributes) in features {
                layer.add_feature(geometry, attributes);
            }
            layer
        })
    })
}

fn feature_id_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(i64::MIN),
        Just(i64::MAX),
        Just(0),
        Just(-1),
        any::<i64>(),
    ]
}

/// Снимок слоя с произвольными уникальными идентификаторами объектов,
/// включая крайние значения `i64`.
pub fn record_strategy() -> impl Strategy<Value = LayerRecord> {
    (
        geometry_kind_strategy(),
        schema_strategy(),
        prop::collection::hash_set(feature_id_strategy(), MEDIUM),
    )
        .prop_flat_map(|(kind, schema, ids)| {
            let ids: Vec<i64> = ids.into_iter().collect();
            let bodies = vec(feature_strategy(kind, &schema), ids.len());
            (Just(kind), Just(schema), Just(ids), bodies)
        })
        .prop_map(|(kind, schema, ids, bodies)| LayerRecord {
            id: "layer".to_string(),
            name: "generated".to_string(),
            geometry_kind: kind,
            schema,
            features: ids
                .into_iter()
                .zip(bodies)
                .map(|(id, (geometry, attributes))| Feature::new(id, geometry, attributes))
                .collect(),
        })
}

/// Объекты в том виде, в каком их хранит слой.
pub fn features_of(layer: &MemoryLayer) -> Vec<Feature> {
    use mlsaver::EligibleLayer;
    layer.features()
}
