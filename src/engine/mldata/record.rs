//! Кодек одной записи слоя.
//!
//! Запись состоит из рамки и полезной нагрузки:
//!
//! ```text
//! layer_id: str | payload_len: u32 | crc32: u32 | payload
//! payload = name: str | geometry_kind: u8
//!         | field_count: u32 | (field_name: str | field_type: u8)*
//!         | feature_count: u32 | (feature_id: i64 | geometry | value*)*
//! ```
//!
//! Идентификатор слоя лежит вне контрольной суммы: при повреждении нагрузки
//! читатель всё ещё может назвать слой, запись которого пропущена.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use mlsaver_error::{CodecError, MlResult, ResultExt, StackError, UnsupportedTypeError};

use super::{
    check_value, compress_block, decompress_block,
    decode::{eof, read_blob},
    read_field_type, read_geometry, read_len, read_str, read_value, write_field_type,
    write_geometry, write_len, write_str, write_value,
};
use crate::{
    host::EligibleLayer,
    layer::{Feature, Field, FieldType, GeometryKind, Schema},
};

/// Предел размера полезной нагрузки одной записи.
pub const MAX_PAYLOAD_LEN: u64 = 1 << 30;

/// Снимок слоя: всё, что попадает в архив.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub id: String,
    pub name: String,
    pub geometry_kind: GeometryKind,
    pub schema: Schema,
    pub features: Vec<Feature>,
}

impl LayerRecord {
    /// Снимает текущее состояние живого слоя.
    pub fn snapshot(layer: &dyn EligibleLayer) -> Self {
        Self {
            id: layer.id().to_string(),
            name: layer.name().to_string(),
            geometry_kind: layer.geometry_kind(),
            schema: layer.schema(),
            features: layer.features(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Проверяет, что запись кодируема целиком: типы полей поддерживаются,
    /// геометрия каждого объекта подходит типу слоя, число атрибутов равно
    /// числу полей и каждое значение соответствует типу своего поля.
    pub fn validate(&self) -> MlResult<()> {
        for field in self.schema.iter() {
            if let FieldType::Other(name) = &field.field_type {
                return Err(UnsupportedTypeError::new(name.clone())
                    .with_field(field.name.clone())
                    .with_layer(self.id.clone())
                    .into());
            }
        }
        for feature in &self.features {
            check_geometry(self.geometry_kind, feature)
                .with_context(|| format!("layer {}", self.id))?;
            if feature.attributes.len() != self.schema.len() {
                return Err(CodecError::FieldCountMismatch {
                    feature: feature.id,
                    expected: self.schema.len(),
                    got: feature.attributes.len(),
                })
                .with_context(|| format!("layer {}", self.id));
            }
            for (field, value) in self.schema.iter().zip(&feature.attributes) {
                check_value(value, &field.field_type).map_err(|e| {
                    name_field(e, &field.name)
                        .context(format!("feature {}", feature.id))
                        .context(format!("layer {}", self.id))
                })?;
            }
        }
        Ok(())
    }
}

/// Геометрия объекта должна подходить типу слоя.
fn check_geometry(
    kind: GeometryKind,
    feature: &Feature,
) -> Result<(), CodecError> {
    match feature.geometry.kind() {
        Some(got) if !kind.accepts(&feature.geometry) => Err(CodecError::TypeMismatch {
            field: None,
            expected: kind.to_string(),
            got: format!("{got} geometry of feature {}", feature.id),
        }),
        _ => Ok(()),
    }
}

/// Дополняет ошибку несоответствия типа именем поля.
fn name_field(
    err: StackError,
    field: &str,
) -> StackError {
    match err.downcast_ref::<CodecError>() {
        Some(codec @ CodecError::TypeMismatch { .. }) => codec.clone().with_field(field).into(),
        _ => err,
    }
}

fn write_payload<W: Write>(
    w: &mut W,
    record: &LayerRecord,
) -> MlResult<()> {
    write_str(w, &record.name)?;
    w.write_u8(record.geometry_kind.into())?;

    write_len(w, record.schema.len(), "field list")?;
    for field in record.schema.iter() {
        write_str(w, &field.name)?;
        write_field_type(w, &field.field_type)?;
    }

    write_len(w, record.features.len(), "feature list")?;
    for feature in &record.features {
        w.write_i64::<BigEndian>(feature.id)?;
        write_geometry(w, &feature.geometry)?;
        for (field, value) in record.schema.iter().zip(&feature.attributes) {
            write_value(w, value, &field.field_type)?;
        }
    }
    Ok(())
}

/// Кодирует полезную нагрузку записи (без рамки).
pub fn encode_payload(
    record: &LayerRecord,
    compress: bool,
) -> MlResult<Vec<u8>> {
    record.validate()?;
    let mut payload = Vec::new();
    write_payload(&mut payload, record)
        .with_context(|| format!("encoding layer {}", record.id))?;
    if compress {
        payload = compress_block(&payload)?;
    }
    Ok(payload)
}

/// Записывает запись целиком: рамку и полезную нагрузку.
///
/// Полезная нагрузка кодируется в буфер до записи первого байта, так что
/// при ошибке кодирования поток не меняется.
pub fn write_record<W: Write>(
    w: &mut W,
    record: &LayerRecord,
    compress: bool,
) -> MlResult<()> {
    let payload = encode_payload(record, compress)?;
    write_str(w, &record.id)?;
    write_len(w, payload.len(), "record payload")?;
    w.write_u32::<BigEndian>(crc32fast::hash(&payload))?;
    w.write_all(&payload)?;
    Ok(())
}

/// Кодирует слой в отдельную несжатую запись.
pub fn encode_layer(layer: &dyn EligibleLayer) -> MlResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_record(&mut buf, &LayerRecord::snapshot(layer), false)?;
    Ok(buf)
}

/// Рамка записи, прочитанная без разбора полезной нагрузки.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub id: String,
    pub crc: u32,
    pub payload: Vec<u8>,
}

/// Читает рамку записи.
///
/// Ошибка здесь означает, что граница следующей записи неизвестна и чтение
/// архива дальше продолжать нельзя.
pub fn read_frame<R: Read>(r: &mut R) -> MlResult<RawRecord> {
    let id = read_str(r, "layer id")?;
    let len = read_len(r, "record payload length")? as u64;
    if len > MAX_PAYLOAD_LEN {
        return Err(CodecError::SizeLimit {
            what: format!("payload of layer {id}"),
            size: len,
            limit: MAX_PAYLOAD_LEN,
        }
        .into());
    }
    let crc = r
        .read_u32::<BigEndian>()
        .map_err(eof("record checksum"))
        .with_context(|| format!("layer {id}"))?;
    let payload = read_blob(r, len, "record payload").with_context(|| format!("layer {id}"))?;
    Ok(RawRecord { id, crc, payload })
}

impl RawRecord {
    /// Сверяет CRC полезной нагрузки.
    pub fn verify(&self) -> MlResult<()> {
        let computed = crc32fast::hash(&self.payload);
        if computed != self.crc {
            return Err(CodecError::ChecksumMismatch {
                layer: self.id.clone(),
                computed,
                recorded: self.crc,
            }
            .into());
        }
        Ok(())
    }

    /// Проверяет CRC, распаковывает и разбирает полезную нагрузку.
    pub fn decode(
        self,
        compressed: bool,
    ) -> MlResult<LayerRecord> {
        self.verify()?;
        let payload = if compressed {
            decompress_block(&self.payload, MAX_PAYLOAD_LEN).with_context(|| format!("layer {}", self.id))?
        } else {
            self.payload
        };
        decode_payload(self.id, &payload)
    }
}

/// Разбирает полезную нагрузку записи слоя `id`.
pub fn decode_payload(
    id: String,
    payload: &[u8],
) -> MlResult<LayerRecord> {
    let mut r = payload;
    let record = read_payload(&mut r, &id).with_context(|| format!("layer {id}"))?;
    if !r.is_empty() {
        return Err(CodecError::TrailingBytes {
            layer: id,
            count: r.len() as u64,
        }
        .into());
    }
    Ok(LayerRecord { id, ..record })
}

fn read_payload(
    r: &mut &[u8],
    id: &str,
) -> MlResult<LayerRecord> {
    let total = r.len();
    let name = read_str(r, "layer name")?;
    let kind_tag = r.read_u8().map_err(eof("geometry kind"))?;
    let geometry_kind = GeometryKind::try_from(kind_tag).map_err(|_| CodecError::InvalidTag {
        what: "geometry kind",
        tag: kind_tag,
        offset: Some((total - r.len() - 1) as u64),
    })?;

    let field_count = read_len(r, "field count")?;
    let mut fields = Vec::with_capacity(field_count.min(1024));
    for _ in 0..field_count {
        let name = read_str(r, "field name")?;
        let field_type = read_field_type(r).with_context(|| format!("field {name}"))?;
        fields.push(Field::new(name, field_type));
    }
    let schema = Schema::new(fields);

    let feature_count = read_len(r, "feature count")?;
    let mut features = Vec::with_capacity(feature_count.min(4096));
    for _ in 0..feature_count {
        let fid = r.read_i64::<BigEndian>().map_err(eof("feature id"))?;
        let geometry = read_geometry(r).with_context(|| format!("feature {fid}"))?;
        let mut attributes = Vec::with_capacity(schema.len());
        for field in schema.iter() {
            let value = read_value(r, &field.field_type)
                .map_err(|e| name_field(e, &field.name).context(format!("feature {fid}")))?;
            attributes.push(value);
        }
        let feature = Feature::new(fid, geometry, attributes);
        check_geometry(geometry_kind, &feature)?;
        features.push(feature);
    }

    Ok(LayerRecord {
        id: id.to_string(),
        name,
        geometry_kind,
        schema,
        features,
    })
}

/// Разбирает одну несжатую запись, закодированную [`encode_layer`].
pub fn decode_layer(bytes: &[u8]) -> MlResult<LayerRecord> {
    let mut r = bytes;
    let raw = read_frame(&mut r)?;
    if !r.is_empty() {
        return Err(CodecError::TrailingBytes {
            layer: raw.id,
            count: r.len() as u64,
        }
        .into());
    }
    raw.decode(false)
}
