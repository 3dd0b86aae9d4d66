//! Десериализация геометрий и значений атрибутов.
//!
//! Значения не несут собственного описания типа сверх тега: читатель
//! знает объявленный тип поля из схемы записи и сверяет с ним тег.

use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, NaiveDate, NaiveTime};
use mlsaver_error::{
    ensure, CodecError, MlResult, StackError, StatusCode, UnsupportedTypeError,
};

use super::{
    field_type_tag,
    tags::{
        GEOM_EMPTY, GEOM_LINESTRING, GEOM_MULTILINESTRING, GEOM_MULTIPOINT, GEOM_MULTIPOLYGON,
        GEOM_POINT, GEOM_POLYGON, MAX_STR_LEN, TAG_BOOL, TAG_DATE, TAG_DATETIME, TAG_INT,
        TAG_NULL, TAG_REAL, TAG_TEXT, TAG_TIME,
    },
};
use crate::layer::{Coord, FieldType, Geometry, Ring, Value};

/// Предел предварительного резервирования по счётчику из файла.
/// Повреждённый счётчик не должен приводить к огромной аллокации.
const PREALLOC_LIMIT: usize = 4096;

/// Превращает обрыв потока в [`CodecError::UnexpectedEof`] с контекстом.
pub(crate) fn eof(context: &str) -> impl FnOnce(io::Error) -> StackError + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::UnexpectedEof {
                context: context.to_string(),
                offset: None,
            }
            .into()
        } else {
            e.into()
        }
    }
}

/// Читает u32 длину или счётчик.
pub fn read_len<R: Read>(
    r: &mut R,
    what: &str,
) -> MlResult<usize> {
    let n = r.read_u32::<BigEndian>().map_err(eof(what))?;
    Ok(n as usize)
}

/// Читает ровно `len` байт без предварительной аллокации всего объёма.
pub fn read_blob<R: Read>(
    r: &mut R,
    len: u64,
    what: &str,
) -> MlResult<Vec<u8>> {
    let mut buf = Vec::with_capacity((len as usize).min(PREALLOC_LIMIT));
    r.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(CodecError::UnexpectedEof {
            context: what.to_string(),
            offset: None,
        }
        .into());
    }
    Ok(buf)
}

/// Читает строку: u32 длина + байты UTF-8.
pub fn read_str<R: Read>(
    r: &mut R,
    what: &str,
) -> MlResult<String> {
    let len = read_len(r, what)? as u64;
    if len > MAX_STR_LEN {
        return Err(CodecError::SizeLimit {
            what: what.to_string(),
            size: len,
            limit: MAX_STR_LEN,
        }
        .into());
    }
    let buf = read_blob(r, len, what)?;
    String::from_utf8(buf).map_err(|_| {
        CodecError::InvalidUtf8 {
            context: what.to_string(),
        }
        .into()
    })
}

fn read_coord<R: Read>(r: &mut R) -> MlResult<Coord> {
    let x = r.read_f64::<BigEndian>().map_err(eof("coordinate"))?;
    let y = r.read_f64::<BigEndian>().map_err(eof("coordinate"))?;
    Ok(Coord { x, y })
}

fn read_coords<R: Read>(r: &mut R) -> MlResult<Vec<Coord>> {
    let n = read_len(r, "coordinate count")?;
    let mut coords = Vec::with_capacity(n.min(PREALLOC_LIMIT));
    for _ in 0..n {
        coords.push(read_coord(r)?);
    }
    Ok(coords)
}

fn read_rings<R: Read>(r: &mut R) -> MlResult<Vec<Ring>> {
    let n = read_len(r, "ring count")?;
    let mut rings = Vec::with_capacity(n.min(PREALLOC_LIMIT));
    for _ in 0..n {
        rings.push(read_coords(r)?);
    }
    Ok(rings)
}

/// Десериализует геометрию из бинарного потока.
pub fn read_geometry<R: Read>(r: &mut R) -> MlResult<Geometry> {
    let tag = r.read_u8().map_err(eof("geometry tag"))?;
    let geometry = match tag {
        GEOM_EMPTY => Geometry::Empty,
        GEOM_POINT => Geometry::Point(read_coord(r)?),
        GEOM_LINESTRING => Geometry::LineString(read_coords(r)?),
        GEOM_POLYGON => Geometry::Polygon(read_rings(r)?),
        GEOM_MULTIPOINT => Geometry::MultiPoint(read_coords(r)?),
        GEOM_MULTILINESTRING => Geometry::MultiLineString(read_rings(r)?),
        GEOM_MULTIPOLYGON => {
            let n = read_len(r, "polygon count")?;
            let mut polys = Vec::with_capacity(n.min(PREALLOC_LIMIT));
            for _ in 0..n {
                polys.push(read_rings(r)?);
            }
            Geometry::MultiPolygon(polys)
        }
        other => {
            return Err(CodecError::InvalidTag {
                what: "geometry",
                tag: other,
                offset: None,
            }
            .into())
        }
    };
    Ok(geometry)
}

/// Декодирует геометрию из буфера, который должен быть прочитан целиком.
pub fn decode_geometry(bytes: &[u8]) -> MlResult<Geometry> {
    let mut slice = bytes;
    let geometry = read_geometry(&mut slice)?;
    ensure!(
        slice.is_empty(),
        StatusCode::CorruptedData,
        "{} trailing bytes after geometry",
        slice.len()
    );
    Ok(geometry)
}

/// Читает тег типа поля.
pub fn read_field_type<R: Read>(r: &mut R) -> MlResult<FieldType> {
    let tag = r.read_u8().map_err(eof("field type"))?;
    let ty = match tag {
        TAG_INT => FieldType::Integer,
        TAG_REAL => FieldType::Real,
        TAG_TEXT => FieldType::Text,
        TAG_BOOL => FieldType::Boolean,
        TAG_DATE => FieldType::Date,
        TAG_TIME => FieldType::Time,
        TAG_DATETIME => FieldType::DateTime,
        other => {
            return Err(CodecError::InvalidTag {
                what: "field type",
                tag: other,
                offset: None,
            }
            .into())
        }
    };
    Ok(ty)
}

fn type_name_of_tag(tag: u8) -> Option<&'static str> {
    let name = match tag {
        TAG_INT => "Integer",
        TAG_REAL => "Real",
        TAG_TEXT => "Text",
        TAG_BOOL => "Boolean",
        TAG_DATE => "Date",
        TAG_TIME => "Time",
        TAG_DATETIME => "DateTime",
        _ => return None,
    };
    Some(name)
}

/// Десериализует значение поля объявленного типа.
///
/// Тег, не совпадающий с объявленным типом, отвергается: значение другого
/// известного типа даёт [`CodecError::TypeMismatch`], неизвестный тег даёт
/// [`CodecError::InvalidTag`].
pub fn read_value<R: Read>(
    r: &mut R,
    declared: &FieldType,
) -> MlResult<Value> {
    let expected = field_type_tag(declared).ok_or_else(|| UnsupportedTypeError::new(declared.name()))?;
    let tag = r.read_u8().map_err(eof("value tag"))?;
    if tag == TAG_NULL {
        return Ok(Value::Null);
    }
    if tag != expected {
        return Err(match type_name_of_tag(tag) {
            Some(got) => CodecError::TypeMismatch {
                field: None,
                expected: declared.name().to_string(),
                got: got.to_string(),
            },
            None => CodecError::InvalidTag {
                what: "value",
                tag,
                offset: None,
            },
        }
        .into());
    }

    let value = match tag {
        TAG_INT => Value::Integer(r.read_i64::<BigEndian>().map_err(eof("integer value"))?),
        TAG_REAL => Value::Real(r.read_f64::<BigEndian>().map_err(eof("real value"))?),
        TAG_TEXT => Value::Text(read_str(r, "text value")?),
        TAG_BOOL => {
            let b = r.read_u8().map_err(eof("boolean value"))?;
            ensure!(
                b <= 1,
                StatusCode::InvalidValue,
                "boolean byte 0x{:02X} is neither 0 nor 1",
                b
            );
            Value::Boolean(b == 1)
        }
        TAG_DATE => {
            let days = r.read_i32::<BigEndian>().map_err(eof("date value"))?;
            let date = NaiveDate::from_num_days_from_ce_opt(days).ok_or_else(|| {
                CodecError::InvalidTimestamp {
                    what: "date",
                    raw: days.to_string(),
                }
            })?;
            Value::Date(date)
        }
        TAG_TIME => {
            let secs = r.read_u32::<BigEndian>().map_err(eof("time value"))?;
            let nanos = r.read_u32::<BigEndian>().map_err(eof("time value"))?;
            let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).ok_or_else(
                || CodecError::InvalidTimestamp {
                    what: "time",
                    raw: format!("{secs}s+{nanos}ns"),
                },
            )?;
            Value::Time(time)
        }
        TAG_DATETIME => {
            let secs = r.read_i64::<BigEndian>().map_err(eof("datetime value"))?;
            let nanos = r.read_u32::<BigEndian>().map_err(eof("datetime value"))?;
            let dt = DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
                CodecError::InvalidTimestamp {
                    what: "datetime",
                    raw: format!("{secs}s+{nanos}ns"),
                }
            })?;
            Value::DateTime(dt.naive_utc())
        }
        other => {
            return Err(CodecError::InvalidTag {
                what: "value",
                tag: other,
                offset: None,
            }
            .into())
        }
    };
    Ok(value)
}

/// Декодирует значение из буфера, который должен быть прочитан целиком.
pub fn decode_value(
    bytes: &[u8],
    declared: &FieldType,
) -> MlResult<Value> {
    let mut slice = bytes;
    let value = read_value(&mut slice, declared)?;
    ensure!(
        slice.is_empty(),
        StatusCode::CorruptedData,
        "{} trailing bytes after value",
        slice.len()
    );
    Ok(value)
}
