use carapace::{GridConfig, GridCoordinate, TileIndex};
use criterion::{Criterion, criterion_group, criterion_main};

fn perf_grid(c: &mut Criterion) {
    c.bench_function("parse_deep_coordinate", |b| {
        b.iter(|| GridCoordinate::parse("EARTH-OC-L100-AB34-CD15-EF01").unwrap())
    });

    let mut index = TileIndex::new(GridConfig::default());
    for row in 0..50 {
        index
            .attach(&format!("doc-{row}"), &format!("L320:AB{row:02}"), true)
            .unwrap();
    }
    c.bench_function("inherited_lookup", |b| {
        b.iter(|| index.documents_at("L320:AB34-CD15", true).unwrap())
    });
}

criterion_group!(benches, perf_grid);
criterion_main!(benches);
