use criterion::{Criterion, black_box, criterion_group, criterion_main};
use geomap_bench::synthetic_markers;
use geomap_core::{EntityId, LineDescriptor};
use geomap_render::{MapView, MapViewConfig, RecordingCanvas};
use std::collections::HashSet;

fn bench_filter_5000_markers(c: &mut Criterion) {
    let markers = synthetic_markers(5000);
    let mut view = MapView::new(RecordingCanvas::new(), MapViewConfig::default());
    view.add_markers(&markers).unwrap();
    let lines: Vec<LineDescriptor> = markers
        .windows(2)
        .map(|pair| LineDescriptor::new(pair[0].id.clone(), pair[1].id.clone()))
        .collect();
    view.add_lines(&lines);

    let half: HashSet<EntityId> = markers
        .iter()
        .step_by(2)
        .map(|m| m.id.clone())
        .collect();

    c.bench_function("filter_5000_markers_half_visible", |b| {
        b.iter(|| {
            let summary = view.filter_entities(black_box(&half));
            black_box(summary);
        })
    });
}

criterion_group!(benches, bench_filter_5000_markers);
criterion_main!(benches);
