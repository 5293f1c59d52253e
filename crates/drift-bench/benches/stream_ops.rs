//! Criterion micro-benchmarks for render command recording and walking.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use drift_arena::Arena;
use drift_render::{CommandStream, DrawTriangles, RenderCommand, VertexBufferHandle};
use glam::{Mat4, Vec3};

fn record(stream: &mut CommandStream, arena: &mut Arena, n: usize) {
    for i in 0..n {
        let transform = Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0));
        stream
            .append(arena, DrawTriangles::new(transform, VertexBufferHandle(1), 3))
            .unwrap();
    }
}

/// Benchmark: record 1000 draws into a fresh frame.
fn bench_record_1k(c: &mut Criterion) {
    let mut arena = Arena::with_label("scratch", 1 << 20);
    let mut stream = CommandStream::new();
    c.bench_function("stream_record_1k", |b| {
        b.iter(|| {
            arena.reset();
            stream.clear();
            record(&mut stream, &mut arena, 1_000);
            black_box(stream.len());
        });
    });
}

/// Benchmark: walk and decode 1000 recorded draws.
fn bench_walk_1k(c: &mut Criterion) {
    let mut arena = Arena::with_label("scratch", 1 << 20);
    let mut stream = CommandStream::new();
    record(&mut stream, &mut arena, 1_000);
    c.bench_function("stream_walk_decode_1k", |b| {
        b.iter(|| {
            let mut vertices = 0u32;
            for node in stream.iter(&arena) {
                if let RenderCommand::DrawTriangles(d) = node.unwrap().decode().unwrap() {
                    vertices += d.vertex_count;
                }
            }
            black_box(vertices);
        });
    });
}

criterion_group!(benches, bench_record_1k, bench_walk_1k);
criterion_main!(benches);
