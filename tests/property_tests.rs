//! Property-based tests для кодека архива слоёв.
//!
//! Проверяют закон `decode(encode(x)) == x` для геометрий, значений и
//! целых слоёв, а также то, что разбор произвольных байтов не паникует.

use std::{cell::RefCell, rc::Rc};

use mlsaver::{
    apply, decode_geometry, decode_value, encode_geometry, encode_value, ArchiveReader,
    ArchiveWriter, EligibleLayer, Geometry, LayerRef, MemoryLayer, Value,
};
use proptest::prelude::*;

mod generators;
use generators::*;

const PROPTEST_CASES: u32 = 256;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn prop_geometry_roundtrip(g in geometry_strategy()) {
        let bytes = encode_geometry(&g).unwrap();
        let back = decode_geometry(&bytes).unwrap();
        prop_assert_eq!(back, g);
    }

    #[test]
    fn prop_value_roundtrip((ty, v) in typed_value_strategy()) {
        let bytes = encode_value(&v, &ty).unwrap();
        let back = decode_value(&bytes, &ty).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn prop_layer_roundtrip(layer in layer_strategy(), compress in any::<bool>()) {
        let expected = features_of(&layer);
        let fresh = MemoryLayer::new(
            layer.id(),
            layer.name(),
            layer.geometry_kind(),
            layer.schema(),
        );

        let source: LayerRef = Rc::new(RefCell::new(layer));
        let bytes = ArchiveWriter::new().compressed(compress).encode(&[source]).unwrap();
        let archive = ArchiveReader::decode(&bytes).unwrap();
        prop_assert_eq!(archive.corrupt_count(), 0);

        let target = Rc::new(RefCell::new(fresh));
        let live: LayerRef = target.clone();
        let report = apply(&archive, &[live]);
        prop_assert_eq!(report.applied(), 1);
        prop_assert!(!report.has_warnings());
        prop_assert_eq!(features_of(&target.borrow()), expected);
    }

    /// Идентификаторы объектов из архива доходят до слоя без изменений,
    /// после чего слой продолжает выдавать новые идентификаторы.
    #[test]
    fn prop_feature_ids_survive_apply(record in record_strategy(), compress in any::<bool>()) {
        let bytes = ArchiveWriter::new()
            .compressed(compress)
            .encode_records(std::slice::from_ref(&record))
            .unwrap();
        let archive = ArchiveReader::decode(&bytes).unwrap();
        prop_assert_eq!(archive.corrupt_count(), 0);

        let target = Rc::new(RefCell::new(MemoryLayer::new(
            record.id.clone(),
            record.name.clone(),
            record.geometry_kind,
            record.schema.clone(),
        )));
        let live: LayerRef = target.clone();
        let report = apply(&archive, &[live]);
        prop_assert_eq!(report.applied(), 1);
        prop_assert!(!report.has_warnings());
        prop_assert_eq!(features_of(&target.borrow()), record.features.clone());

        let attributes = vec![Value::Null; record.schema.len()];
        target.borrow_mut().add_feature(Geometry::Empty, attributes);
        prop_assert_eq!(target.borrow().feature_count(), record.features.len() + 1);
    }

    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = ArchiveReader::decode(&bytes);
        let _ = decode_geometry(&bytes);
    }

    /// Любой испорченный байт после заголовка даёт либо предупреждение по
    /// записи, либо (если задет только идентификатор) запись под другим
    /// именем. Паники и фатальной ошибки нет.
    #[test]
    fn prop_flipped_byte_is_contained(layer in layer_strategy(), pos in any::<prop::sample::Index>(), bit in 0u8..8) {
        let source: LayerRef = Rc::new(RefCell::new(layer));
        let mut bytes = ArchiveWriter::new().encode(&[source]).unwrap();
        let header = 9;
        let i = header + pos.index(bytes.len() - header);
        bytes[i] ^= 1 << bit;

        let archive = ArchiveReader::decode(&bytes);
        prop_assert!(archive.is_ok());
    }
}
