use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::{LineString, Polygon, coord};
use spatio_shapes::{Config, Geometry, Relation, ShapeIndex, to_geojson};
use std::hint::black_box;

const BANDS: [&str; 5] = [
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-147,59],[-147,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-151,59],[-151,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61],[-151,61],[-151,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61],[-151.9,61],[-151.9,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61.9],[-151.9,61.9],[-151.9,62],[-152,62]]]}"#,
];

fn dataset(count: usize) -> Vec<(i64, Geometry)> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|i| {
            let lon = -155.0 + next() * 10.0;
            let lat = 58.0 + next() * 6.0;
            let geometry = if i % 3 == 0 {
                let size = 0.01 + next() * 0.2;
                Geometry::Polygon(Polygon::new(
                    LineString::from(vec![
                        coord! { x: lon, y: lat },
                        coord! { x: lon + size, y: lat },
                        coord! { x: lon + size / 2.0, y: lat + size },
                        coord! { x: lon, y: lat },
                    ]),
                    vec![],
                ))
            } else {
                Geometry::point(lon, lat)
            };
            (i as i64, geometry)
        })
        .collect()
}

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");
    let payloads: Vec<(i64, String)> = dataset(10_000)
        .into_iter()
        .map(|(id, geometry)| (id, to_geojson(&geometry).unwrap()))
        .collect();

    group.throughput(Throughput::Elements(payloads.len() as u64));
    for batch_size in [100, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("geojson", batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    let index = ShapeIndex::new();
                    index
                        .ingest(payloads.iter().map(|(id, p)| (*id, p)), batch_size)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_nested_band_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_bands");
    let index = ShapeIndex::new();
    index.ingest(dataset(50_000), 5_000).unwrap();

    for (n, band) in BANDS.iter().enumerate() {
        let query = spatio_shapes::parse_geojson(band).unwrap();
        group.bench_with_input(BenchmarkId::new("within", n + 1), &query, |b, query| {
            b.iter(|| index.query(black_box(query), Relation::Within, 10).unwrap());
        });
    }

    let first = spatio_shapes::parse_geojson(BANDS[0]).unwrap();
    group.bench_function("scan_within_1", |b| {
        b.iter(|| index.scan(black_box(&first), Relation::Within).unwrap());
    });

    group.finish();
}

fn bench_cell_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_size");
    let docs = dataset(20_000);
    let query = spatio_shapes::parse_geojson(BANDS[2]).unwrap();

    for cell_size in [0.1, 0.5, 1.0, 5.0] {
        let index = ShapeIndex::with_config(Config::default().with_cell_size(cell_size)).unwrap();
        index.ingest(docs.clone(), 5_000).unwrap();

        group.bench_with_input(
            BenchmarkId::new("intersects", cell_size),
            &cell_size,
            |b, _| {
                b.iter(|| index.query(black_box(&query), Relation::Intersects, 10).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ingestion,
    bench_nested_band_queries,
    bench_cell_size
);
criterion_main!(benches);
