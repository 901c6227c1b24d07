use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use powermon_core::registers::{
    self, Averaging, ConversionTime, DeviceConfiguration,
};

fn benchmark_config_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_encoding");

    let configs = [
        ("default", DeviceConfiguration::default()),
        (
            "both_channels_averaged",
            DeviceConfiguration {
                measure_current: true,
                measure_voltage: true,
                continuous: true,
                averaging: Averaging::X64,
                conversion_time: ConversionTime::Us1100,
            },
        ),
    ];

    for (name, config) in &configs {
        group.bench_with_input(BenchmarkId::new("encode", name), config, |b, config| {
            b.iter(|| registers::encode_config(black_box(config)));
        });
    }
    group.finish();
}

fn benchmark_reading_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("reading_decode");
    group.throughput(Throughput::Elements(1));

    group.bench_function("decode_current", |b| {
        b.iter(|| registers::decode_current(black_box(0xFFC0)));
    });
    group.bench_function("decode_voltage", |b| {
        b.iter(|| registers::decode_voltage(black_box(0x0FA0)));
    });
    group.bench_function("decode_power", |b| {
        b.iter(|| registers::decode_power(black_box(0x0064)));
    });
    group.finish();
}

fn benchmark_wire_conversion(c: &mut Criterion) {
    c.bench_function("from_wire", |b| {
        b.iter(|| registers::from_wire(black_box(0x4954)));
    });
}

criterion_group!(
    benches,
    benchmark_config_encoding,
    benchmark_reading_decode,
    benchmark_wire_conversion
);
criterion_main!(benches);
