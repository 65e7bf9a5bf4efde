//! Benchmarks pour l'extraction de polygones et le jeton base64

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geoupload::{codec, parse_uploaded_file, UploadedFile};

/// Polygone régulier de `n` sommets autour de Guadalajara
fn synthetic_ring(n: usize) -> Vec<[f64; 2]> {
    let mut ring: Vec<[f64; 2]> = (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            [-103.35 + 0.001 * angle.cos(), 20.66 + 0.001 * angle.sin()]
        })
        .collect();
    ring.push(ring[0]);
    ring
}

fn synthetic_geojson(n: usize) -> String {
    let coords = serde_json::to_string(&synthetic_ring(n)).unwrap();
    format!(
        r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":[{}]}}}}]}}"#,
        coords
    )
}

fn synthetic_kml(n: usize) -> String {
    let coords: Vec<String> = synthetic_ring(n)
        .iter()
        .map(|[lon, lat]| format!("{},{},0", lon, lat))
        .collect();
    format!(
        r#"<kml><Document><Placemark><Polygon><outerBoundaryIs><LinearRing><coordinates>{}</coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark></Document></kml>"#,
        coords.join(" ")
    )
}

fn find_fixtures() -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for pattern in ["tests/fixtures/*.geojson", "tests/fixtures/*.kml"] {
        if let Ok(paths) = glob::glob(pattern) {
            files.extend(paths.filter_map(|p| p.ok()));
        }
    }
    files
}

fn bench_parse_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_upload");

    for n in [16usize, 1_000, 20_000] {
        let geojson = UploadedFile::new("bench.geojson", synthetic_geojson(n).into_bytes());
        group.throughput(Throughput::Bytes(geojson.content.len() as u64));
        group.bench_with_input(BenchmarkId::new("geojson", n), &geojson, |b, file| {
            b.iter(|| black_box(parse_uploaded_file(black_box(file))))
        });

        let kml = UploadedFile::new("bench.kml", synthetic_kml(n).into_bytes());
        group.throughput(Throughput::Bytes(kml.content.len() as u64));
        group.bench_with_input(BenchmarkId::new("kml", n), &kml, |b, file| {
            b.iter(|| black_box(parse_uploaded_file(black_box(file))))
        });
    }

    group.finish();
}

fn bench_fixtures(c: &mut Criterion) {
    let fixtures = find_fixtures();
    if fixtures.is_empty() {
        eprintln!("No fixtures found, skipping benchmark");
        return;
    }

    let files: Vec<UploadedFile> = fixtures
        .iter()
        .filter_map(|path| {
            let content = std::fs::read(path).ok()?;
            let name = path.file_name()?.to_string_lossy().into_owned();
            Some(UploadedFile::new(name, content))
        })
        .collect();

    let mut group = c.benchmark_group("parse_fixtures");
    group.bench_function("all_fixtures", |b| {
        b.iter(|| {
            let ok = files
                .iter()
                .filter(|f| parse_uploaded_file(black_box(f)).is_success())
                .count();
            black_box(ok)
        })
    });
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let ring = synthetic_ring(1_000);
    let token = codec::encode(&ring);

    let mut group = c.benchmark_group("codec");
    group.bench_function("encode_1000", |b| b.iter(|| codec::encode(black_box(&ring))));
    group.bench_function("decode_1000", |b| b.iter(|| codec::decode(black_box(&token))));
    group.finish();
}

criterion_group!(benches, bench_parse_formats, bench_fixtures, bench_codec);
criterion_main!(benches);
