use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{Datelike, Timelike};
use mlsaver_error::{CodecError, MlResult, UnsupportedTypeError};

use super::tags::{
    GEOM_EMPTY, GEOM_LINESTRING, GEOM_MULTILINESTRING, GEOM_MULTIPOINT, GEOM_MULTIPOLYGON,
    GEOM_POINT, GEOM_POLYGON, MAX_STR_LEN, TAG_BOOL, TAG_DATE, TAG_DATETIME, TAG_INT, TAG_NULL,
    TAG_REAL, TAG_TEXT, TAG_TIME,
};
use crate::layer::{Coord, FieldType, Geometry, Ring, Value};

/// Записывает длину или счётчик как u32.
pub fn write_len<W: Write>(
    w: &mut W,
    len: usize,
    what: &str,
) -> MlResult<()> {
    let n = u32::try_from(len).map_err(|_| CodecError::SizeLimit {
        what: what.to_string(),
        size: len as u64,
        limit: u64::from(u32::MAX),
    })?;
    w.write_u32::<BigEndian>(n)?;
    Ok(())
}

/// Записывает строку: u32 длина + байты UTF-8.
pub fn write_str<W: Write>(
    w: &mut W,
    s: &str,
) -> MlResult<()> {
    let b = s.as_bytes();
    if b.len() as u64 > MAX_STR_LEN {
        return Err(CodecError::SizeLimit {
            what: "string".to_string(),
            size: b.len() as u64,
            limit: MAX_STR_LEN,
        }
        .into());
    }
    write_len(w, b.len(), "string")?;
    w.write_all(b)?;
    Ok(())
}

fn write_coord<W: Write>(
    w: &mut W,
    c: &Coord,
) -> MlResult<()> {
    w.write_f64::<BigEndian>(c.x)?;
    w.write_f64::<BigEndian>(c.y)?;
    Ok(())
}

fn write_coords<W: Write>(
    w: &mut W,
    coords: &[Coord],
) -> MlResult<()> {
    write_len(w, coords.len(), "coordinate list")?;
    for c in coords {
        write_coord(w, c)?;
    }
    Ok(())
}

fn write_rings<W: Write>(
    w: &mut W,
    rings: &[Ring],
) -> MlResult<()> {
    write_len(w, rings.len(), "ring list")?;
    for ring in rings {
        write_coords(w, ring)?;
    }
    Ok(())
}

/// Запись геометрии в поток.
///
/// Координаты пишутся как пары f64 без преобразований, поэтому чтение
/// возвращает побитово те же значения.
pub fn write_geometry<W: Write>(
    w: &mut W,
    g: &Geometry,
) -> MlResult<()> {
    match g {
        Geometry::Empty => w.write_u8(GEOM_EMPTY)?,
        Geometry::Point(c) => {
            w.write_u8(GEOM_POINT)?;
            write_coord(w, c)?;
        }
        Geometry::LineString(coords) => {
            w.write_u8(GEOM_LINESTRING)?;
            write_coords(w, coords)?;
        }
        Geometry::Polygon(rings) => {
            w.write_u8(GEOM_POLYGON)?;
            write_rings(w, rings)?;
        }
        Geometry::MultiPoint(coords) => {
            w.write_u8(GEOM_MULTIPOINT)?;
            write_coords(w, coords)?;
        }
        Geometry::MultiLineString(lines) => {
            w.write_u8(GEOM_MULTILINESTRING)?;
            write_rings(w, lines)?;
        }
        Geometry::MultiPolygon(polys) => {
            w.write_u8(GEOM_MULTIPOLYGON)?;
            write_len(w, polys.len(), "polygon list")?;
            for rings in polys {
                write_rings(w, rings)?;
            }
        }
    }
    Ok(())
}

/// Кодирует геометрию в отдельный буфер.
pub fn encode_geometry(g: &Geometry) -> MlResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_geometry(&mut buf, g)?;
    Ok(buf)
}

/// Тег типа поля. Для `FieldType::Other` кодировки нет.
pub fn field_type_tag(ty: &FieldType) -> Option<u8> {
    let tag = match ty {
        FieldType::Integer => TAG_INT,
        FieldType::Real => TAG_REAL,
        FieldType::Text => TAG_TEXT,
        FieldType::Boolean => TAG_BOOL,
        FieldType::Date => TAG_DATE,
        FieldType::Time => TAG_TIME,
        FieldType::DateTime => TAG_DATETIME,
        FieldType::Other(_) => return None,
    };
    Some(tag)
}

/// Записывает тег типа поля.
pub fn write_field_type<W: Write>(
    w: &mut W,
    ty: &FieldType,
) -> MlResult<()> {
    let tag = field_type_tag(ty).ok_or_else(|| UnsupportedTypeError::new(ty.name()))?;
    w.write_u8(tag)?;
    Ok(())
}

/// Проверяет, что значение можно записать в поле объявленного типа.
///
/// Неявных преобразований нет: `Integer` в поле `Real` отвергается.
pub fn check_value(
    value: &Value,
    declared: &FieldType,
) -> MlResult<()> {
    if let FieldType::Other(name) = declared {
        return Err(UnsupportedTypeError::new(name.clone()).into());
    }
    if !value.conforms_to(declared) {
        return Err(CodecError::TypeMismatch {
            field: None,
            expected: declared.name().to_string(),
            got: value.type_name().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Запись значения атрибута в поток.
///
/// Значение проверяется до записи первого байта, так что при ошибке поток
/// не меняется.
pub fn write_value<W: Write>(
    w: &mut W,
    value: &Value,
    declared: &FieldType,
) -> MlResult<()> {
    check_value(value, declared)?;
    match value {
        Value::Null => w.write_u8(TAG_NULL)?,
        Value::Integer(i) => {
            w.write_u8(TAG_INT)?;
            w.write_i64::<BigEndian>(*i)?;
        }
        Value::Real(f) => {
            w.write_u8(TAG_REAL)?;
            w.write_f64::<BigEndian>(*f)?;
        }
        Value::Text(s) => {
            w.write_u8(TAG_TEXT)?;
            write_str(w, s)?;
        }
        Value::Boolean(b) => {
            w.write_u8(TAG_BOOL)?;
            w.write_u8(u8::from(*b))?;
        }
        Value::Date(d) => {
            w.write_u8(TAG_DATE)?;
            w.write_i32::<BigEndian>(d.num_days_from_ce())?;
        }
        Value::Time(t) => {
            w.write_u8(TAG_TIME)?;
            w.write_u32::<BigEndian>(t.num_seconds_from_midnight())?;
            w.write_u32::<BigEndian>(t.nanosecond())?;
        }
        Value::DateTime(dt) => {
            let utc = dt.and_utc();
            w.write_u8(TAG_DATETIME)?;
            w.write_i64::<BigEndian>(utc.timestamp())?;
            w.write_u32::<BigEndian>(utc.timestamp_subsec_nanos())?;
        }
    }
    Ok(())
}

/// Кодирует значение в отдельный буфер.
pub fn encode_value(
    value: &Value,
    declared: &FieldType,
) -> MlResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, declared)?;
    Ok(buf)
}
