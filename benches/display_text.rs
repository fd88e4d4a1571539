//! Benchmarks for display text composition
//!
//! Tests performance of building tooltip rows and search text from
//! generation metadata of varying size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use imagedrawer::display::{compose, search_text, space_after_commas, tooltip_rows};
use imagedrawer::filter::KeyFilter;
use imagedrawer_metadata::MetadataMap;

/// Typical txt2img metadata with long prompts
fn typical_metadata() -> MetadataMap {
    [
        (
            "positive_prompt",
            "masterpiece,best quality,1girl,solo,long hair,looking at viewer,smile,\\nstanding,outdoors,sky,cloud",
        ),
        ("negative_prompt", "lowres,bad anatomy,bad hands,text,error,missing fingers"),
        ("seed", "1234567890"),
        ("steps", "30"),
        ("cfg", "7.5"),
        ("sampler_name", "dpmpp_2m"),
        ("scheduler", "karras"),
        ("model", "sdxl_base_1.0.safetensors"),
    ]
    .into_iter()
    .collect()
}

/// Metadata with many generic keys, as written by large node graphs
fn wide_metadata(keys: usize) -> MetadataMap {
    let mut metadata = typical_metadata();
    for i in 0..keys {
        metadata.insert(format!("node_{i:04}_widget"), format!("value {i}\\nwith break"));
    }
    metadata
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let metadata = typical_metadata();
    let surface_all = KeyFilter::surface_all();
    let deny = KeyFilter::parse("workflow, prompt, seed", false);
    let allow = KeyFilter::parse("seed, steps, cfg", true);

    group.bench_function("typical/surface_all", |b| {
        b.iter(|| compose(black_box(&metadata), black_box(&surface_all)))
    });

    group.bench_function("typical/deny_list", |b| {
        b.iter(|| compose(black_box(&metadata), black_box(&deny)))
    });

    group.bench_function("typical/allow_list", |b| {
        b.iter(|| compose(black_box(&metadata), black_box(&allow)))
    });

    group.finish();
}

fn bench_wide_metadata(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_metadata");
    let filter = KeyFilter::surface_all();

    for keys in [16, 128, 1024] {
        let metadata = wide_metadata(keys);
        group.bench_with_input(BenchmarkId::new("search_text", keys), &metadata, |b, m| {
            b.iter(|| search_text(black_box(m), black_box(&filter)))
        });
        group.bench_with_input(BenchmarkId::new("tooltip_rows", keys), &metadata, |b, m| {
            b.iter(|| tooltip_rows(black_box(m), black_box(&filter)))
        });
    }

    group.finish();
}

fn bench_comma_spacing(c: &mut Criterion) {
    let prompt = "tag,".repeat(500);
    c.bench_function("space_after_commas/500_tags", |b| {
        b.iter(|| space_after_commas(black_box(&prompt)))
    });
}

criterion_group!(
    benches,
    bench_compose,
    bench_wide_metadata,
    bench_comma_spacing
);
criterion_main!(benches);
