use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use classweave::protocol::{Message, TAG_SIZE};

fn bench_encode(c: &mut Criterion) {
    let message = Message::LoadJar {
        path: PathBuf::from("/opt/patches/service-hotfix-2024-11.jar"),
        entry_class: "com.example.patch.ServiceHotfix".to_string(),
    };

    c.bench_function("encode_load_jar", |b| {
        b.iter(|| black_box(&message).encode())
    });
}

fn bench_decode(c: &mut Criterion) {
    let frame = Message::LoadJar {
        path: PathBuf::from("/opt/patches/service-hotfix-2024-11.jar"),
        entry_class: "com.example.patch.ServiceHotfix".to_string(),
    }
    .encode();
    let tag = u32::from_ne_bytes(frame[..TAG_SIZE].try_into().unwrap());

    c.bench_function("decode_load_jar", |b| {
        b.iter(|| Message::decode(tag, black_box(&frame[TAG_SIZE..])))
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
