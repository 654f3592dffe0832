use criterion::{black_box, criterion_group, criterion_main, Criterion};

use framevault::{data_to_frames, frames_to_data, BlockAlphabet, FrameGeometry, Redundancy};

fn bench_geometry() -> FrameGeometry {
    FrameGeometry::new(320, 240, 2, BlockAlphabet::Quad).unwrap()
}

fn bench_redundancy() -> Redundancy {
    Redundancy::new(2048, 4, 2).unwrap()
}

fn encode_benchmark(c: &mut Criterion) {
    let data: Vec<u8> = (0..64 * 1024).map(|i| (i % 253) as u8).collect();
    c.bench_function("encode 64 KiB", |b| {
        b.iter(|| {
            let frames =
                data_to_frames(bench_geometry(), bench_redundancy(), black_box(&data)).unwrap();
            black_box(frames.len())
        })
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let data: Vec<u8> = (0..64 * 1024).map(|i| (i % 253) as u8).collect();
    let frames = data_to_frames(bench_geometry(), bench_redundancy(), &data).unwrap();
    c.bench_function("decode 64 KiB", |b| {
        b.iter(|| {
            let report = frames_to_data(bench_geometry(), black_box(&frames)).unwrap();
            black_box(report.data.len())
        })
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
