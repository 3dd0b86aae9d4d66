use std::{cell::RefCell, hint::black_box, rc::Rc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mlsaver::{
    apply, decode_geometry, encode_geometry, ArchiveReader, ArchiveWriter, Field, FieldType,
    Geometry, GeometryKind, LayerRef, MemoryLayer, Schema, Value,
};

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("id", FieldType::Integer),
        Field::new("height", FieldType::Real),
        Field::new("name", FieldType::Text),
        Field::new("visible", FieldType::Boolean),
    ])
}

fn polygon(i: usize) -> Geometry {
    let x = i as f64;
    Geometry::Polygon(vec![(0..32)
        .map(|k| {
            let a = k as f64 / 32.0 * std::f64::consts::TAU;
            (x + a.cos(), a.sin()).into()
        })
        .collect()])
}

fn layer(features: usize) -> MemoryLayer {
    let mut layer = MemoryLayer::new("bench", "bench", GeometryKind::Polygon, schema());
    for i in 0..features {
        layer.add_feature(
            polygon(i),
            vec![
                Value::Integer(i as i64),
                Value::Real(i as f64 * 0.5),
                Value::Text(format!("feature-{i}")),
                if i % 3 == 0 {
                    Value::Null
                } else {
                    Value::Boolean(i % 2 == 0)
                },
            ],
        );
    }
    layer
}

fn bench_geometry(c: &mut Criterion) {
    let g = polygon(7);
    let bytes = encode_geometry(&g).unwrap();

    c.bench_function("encode_geometry polygon/32", |b| {
        b.iter(|| encode_geometry(black_box(&g)).unwrap())
    });
    c.bench_function("decode_geometry polygon/32", |b| {
        b.iter(|| decode_geometry(black_box(&bytes)).unwrap())
    });
}

fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive");
    for &n in &[100usize, 1_000, 10_000] {
        let source: LayerRef = Rc::new(RefCell::new(layer(n)));
        let layers = [source];
        group.throughput(Throughput::Elements(n as u64));

        for (label, compress) in [("plain", false), ("zstd", true)] {
            let writer = ArchiveWriter::new().compressed(compress);
            let bytes = writer.encode(&layers).unwrap();

            group.bench_with_input(BenchmarkId::new(format!("encode/{label}"), n), &n, |b, _| {
                b.iter(|| writer.encode(black_box(&layers)).unwrap())
            });
            group.bench_with_input(BenchmarkId::new(format!("decode/{label}"), n), &n, |b, _| {
                b.iter(|| ArchiveReader::decode(black_box(&bytes)).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let source: LayerRef = Rc::new(RefCell::new(layer(1_000)));
    let bytes = ArchiveWriter::new().encode(&[source]).unwrap();
    let archive = ArchiveReader::decode(&bytes).unwrap();
    let target: LayerRef = Rc::new(RefCell::new(MemoryLayer::new(
        "bench",
        "bench",
        GeometryKind::Polygon,
        schema(),
    )));
    let targets = [target];

    c.bench_function("apply 1000 features", |b| {
        b.iter(|| apply(black_box(&archive), &targets))
    });
}

criterion_group!(benches, bench_geometry, bench_archive, bench_apply);
criterion_main!(benches);
