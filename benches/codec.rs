//! Benchmarks for the document codec and the container layer.
//!
//! Run with: cargo bench --bench codec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ison_pack::{
    decode, encode, pack, unpack, Compress, InterningTable, Value, VersionProfile,
    LARGE_CAPACITY,
};
use std::sync::Arc;

fn strings() -> InterningTable {
    [
        (1u16, "loadouts"),
        (2, "slotType"),
        (3, "itemAssetName"),
        (4, "Hat"),
        (5, "Shoes"),
        (6, "Gloves"),
    ]
    .into_iter()
    .collect()
}

fn loadouts(slots: usize) -> Value {
    let kinds = ["Hat", "Shoes", "Gloves"];
    let items: Value = (0..slots)
        .map(|i| {
            Value::Object(vec![
                ("slotType".into(), kinds[i % kinds.len()].into()),
                ("itemAssetName".into(), format!("item_{:03}", i).into()),
                ("tint".into(), Value::Double(i as f64 * 0.25)),
                ("count".into(), Value::from(i)),
            ])
        })
        .collect();
    Value::Object(vec![("loadouts".into(), items)])
}

fn bench_codec(c: &mut Criterion) {
    let table = strings();
    let mut group = c.benchmark_group("codec");
    for slots in [1usize, 8, 32] {
        let value = loadouts(slots);
        let enc = encode(&value, &table);
        group.throughput(Throughput::Bytes(enc.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", slots), &value, |b, value| {
            b.iter(|| encode(black_box(value), &table))
        });
        group.bench_with_input(BenchmarkId::new("decode", slots), &enc, |b, enc| {
            b.iter(|| decode(black_box(enc), &table).unwrap())
        });
    }
    group.finish();
}

fn bench_container(c: &mut Criterion) {
    let table = Arc::new(strings());
    let mut dict = Vec::new();
    for _ in 0..16 {
        dict.extend_from_slice(b"loadouts slotType itemAssetName Hat Shoes Gloves item_0 tint count ");
    }
    let profiles = [
        VersionProfile::new("deflate", LARGE_CAPACITY, Compress::default(), table.clone()).unwrap(),
        VersionProfile::new(
            "dict",
            LARGE_CAPACITY,
            Compress::new_dict(dict).unwrap(),
            table.clone(),
        )
        .unwrap(),
    ];
    let payload = encode(&loadouts(8), &table);

    let mut group = c.benchmark_group("container");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    for profile in profiles.iter() {
        let raw = pack(&payload, profile).unwrap();
        group.bench_with_input(BenchmarkId::new("pack", profile.name()), profile, |b, p| {
            b.iter(|| pack(black_box(&payload), p).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("unpack", profile.name()), profile, |b, p| {
            b.iter(|| unpack(black_box(&raw), p).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_container);
criterion_main!(benches);
