//! Benchmarks for the per-event and per-frame paths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quake_map::map::{MapRenderer, Viewport};
use quake_map::quake::{classify, parse_event_feed, EventBatch, SeismicEvent};

/// Deterministic spread of magnitudes and positions
fn synthetic_events(n: usize) -> Vec<SeismicEvent> {
    (0..n)
        .map(|i| SeismicEvent {
            lon: (i as f64 * 37.0) % 360.0 - 180.0,
            lat: (i as f64 * 13.0) % 160.0 - 80.0,
            magnitude: (i % 90) as f64 / 10.0,
            place: format!("{i}km N of Somewhere"),
            time: None,
        })
        .collect()
}

fn synthetic_feed(n: usize) -> Vec<u8> {
    let features: Vec<String> = synthetic_events(n)
        .iter()
        .map(|e| {
            format!(
                r#"{{"type":"Feature","properties":{{"mag":{},"place":"{}","time":1700000000000}},"geometry":{{"type":"Point","coordinates":[{},{},10.0]}}}}"#,
                e.magnitude, e.place, e.lon, e.lat
            )
        })
        .collect();
    format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(",")).into_bytes()
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let mags: Vec<f64> = (0..1000).map(|i| i as f64 / 100.0).collect();
    group.throughput(Throughput::Elements(mags.len() as u64));

    group.bench_function("sweep_0_to_10", |b| {
        b.iter(|| {
            for &m in &mags {
                black_box(classify(black_box(m)));
            }
        });
    });

    group.finish();
}

fn bench_parse_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_event_feed");

    for size in [100, 1000, 5000].iter() {
        let feed = synthetic_feed(*size);
        group.throughput(Throughput::Bytes(feed.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &feed, |b, feed| {
            b.iter(|| {
                // simd-json parses in place
                let mut bytes = feed.clone();
                black_box(parse_event_feed(&mut bytes))
            });
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");

    let mut map = MapRenderer::new();
    map.render_events(EventBatch {
        events: synthetic_events(2000),
        skipped: 0,
    });
    quake_map::data::generate_simple_world(&mut map);

    let (w, h) = (200, 50);
    let viewport = Viewport::new(-50.0, 15.55, 1.0, w * 2, h * 4);

    group.bench_function("world_200x50", |b| {
        b.iter(|| black_box(map.render(w, h, &viewport)));
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_parse_feed, bench_render);
criterion_main!(benches);
