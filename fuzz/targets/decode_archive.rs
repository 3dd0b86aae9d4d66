#![no_main]

use libfuzzer_sys::fuzz_target;
use mlsaver::{apply, ArchiveReader, ArchiveWriter, LayerRef};

fuzz_target!(|data: &[u8]| {
    // Разбор произвольных байтов не должен паниковать.
    let Ok(archive) = ArchiveReader::decode(data) else {
        return;
    };

    // Всё, что удалось прочитать, записывается обратно и читается так же.
    let records: Vec<_> = archive.records().cloned().collect();
    let bytes = ArchiveWriter::new()
        .encode_records(&records)
        .expect("decoded records must re-encode");
    let again = ArchiveReader::decode(&bytes).expect("re-encoded archive must decode");
    let again: Vec<_> = again.records().cloned().collect();
    assert_eq!(records.len(), again.len());
    for (a, b) in records.iter().zip(&again) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.schema, b.schema);
        assert_eq!(a.feature_count(), b.feature_count());
    }

    let no_layers: [LayerRef; 0] = [];
    let _ = apply(&archive, &no_layers);
});
