#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mlsaver::{decode_geometry, decode_value, encode_value, FieldType};

#[derive(Debug, Arbitrary)]
enum FuzzType {
    Integer,
    Real,
    Text,
    Boolean,
    Date,
    Time,
    DateTime,
}

impl From<FuzzType> for FieldType {
    fn from(t: FuzzType) -> Self {
        match t {
            FuzzType::Integer => FieldType::Integer,
            FuzzType::Real => FieldType::Real,
            FuzzType::Text => FieldType::Text,
            FuzzType::Boolean => FieldType::Boolean,
            FuzzType::Date => FieldType::Date,
            FuzzType::Time => FieldType::Time,
            FuzzType::DateTime => FieldType::DateTime,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    declared: FuzzType,
}

fuzz_target!(|input: FuzzInput| {
    let _ = decode_geometry(&input.data);

    let declared: FieldType = input.declared.into();
    if let Ok(value) = decode_value(&input.data, &declared) {
        // Прочитанное значение кодируется обратно в те же байты.
        let bytes = encode_value(&value, &declared).expect("decoded value must re-encode");
        assert_eq!(bytes, input.data);
    }
});
