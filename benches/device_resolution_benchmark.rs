use criterion::{criterion_group, criterion_main, Criterion};
use music_dashboard::models::Device;
use music_dashboard::services::resolve_device;
use std::hint::black_box;

fn benchmark_resolve_device(c: &mut Criterion) {
    // A busy household: many devices, the active one last
    let mut devices: Vec<Device> = (0..64)
        .map(|i| Device::new(&format!("id-{}", i), &format!("Speaker {}", i), false))
        .collect();
    devices.push(Device::new("id-active", "Living Room", true));

    let mut group = c.benchmark_group("resolve_device");

    group.bench_function("by_id", |b| {
        b.iter(|| resolve_device(black_box(&devices), Some("id-32"), None).is_ok())
    });

    group.bench_function("by_name_case_insensitive", |b| {
        b.iter(|| resolve_device(black_box(&devices), None, Some("SPEAKER 63")).is_ok())
    });

    group.bench_function("fallback_to_active", |b| {
        b.iter(|| resolve_device(black_box(&devices), Some("missing"), Some("Garage")).is_ok())
    });

    group.finish();
}

criterion_group!(benches, benchmark_resolve_device);
criterion_main!(benches);
