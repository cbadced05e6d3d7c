//! Benchmarks for whole-buffer filtering and the live chunk spectrum
//!
//! Run with: cargo bench -p spectral-studio-core --bench spectral_filter

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spectral_studio::filters::{FilterSpec, SpectralFilter};
use spectral_studio::signal::SampleBuffer;
use spectral_studio::spectrum::{AnalyzerConfig, ChunkAnalyzer};
use std::f64::consts::PI;

/// Two-tone test signal at 440 Hz and 2 kHz
fn two_tone(sample_rate: u32, duration_secs: f64) -> Vec<i16> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let value = 0.4 * (2.0 * PI * 440.0 * t).sin() + 0.4 * (2.0 * PI * 2000.0 * t).sin();
            (value * 32767.0) as i16
        })
        .collect()
}

fn bench_filter_lengths(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_filter");
    let sample_rate = 44100;

    for duration in [1.0, 5.0, 30.0] {
        let buffer = SampleBuffer::from_i16(two_tone(sample_rate, duration), sample_rate).unwrap();
        group.throughput(Throughput::Elements(buffer.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("low_pass_500", format!("{}s", duration)),
            &buffer,
            |b, buffer| {
                let mut filter = SpectralFilter::new();
                b.iter(|| black_box(filter.apply(black_box(buffer), FilterSpec::low_pass(500.0)).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_filter_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_kind");
    let buffer = SampleBuffer::from_i16(two_tone(44100, 5.0), 44100).unwrap();

    for spec in [
        FilterSpec::low_pass(500.0),
        FilterSpec::high_pass(1000.0),
        FilterSpec::band_pass(300.0, 3000.0),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(spec), &spec, |b, &spec| {
            let mut filter = SpectralFilter::new();
            b.iter(|| black_box(filter.apply(&buffer, spec).unwrap()));
        });
    }

    group.finish();
}

fn bench_chunk_analyzer(c: &mut Criterion) {
    let chunk: Vec<i16> = two_tone(44100, 1.0).into_iter().take(1024).collect();
    let mut analyzer = ChunkAnalyzer::new(AnalyzerConfig::default());

    c.bench_function("chunk_analyzer_1024", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(&chunk)).unwrap()))
    });
}

criterion_group!(benches, bench_filter_lengths, bench_filter_kinds, bench_chunk_analyzer);
criterion_main!(benches);
