use criterion::{black_box, criterion_group, criterion_main, Criterion};
use livecanvas_editor::{extract_bindings, patch, PropertyChanges};

fn deck_source(items: usize) -> String {
    let mut body = String::new();
    for i in 0..items {
        body.push_str(&format!(
            "      <p style={{{{left:'{}px', top:'{}px', width:'200px', height:'24px'}}}}>Line {}</p>\n",
            i * 4,
            i * 24,
            i
        ));
    }
    format!(
        "export default function Slide({{ data }}) {{\n  return (\n    <div>\n      <h1>{{data.title}}</h1>\n{}    </div>\n  );\n}}\n",
        body
    )
}

fn patch_geometry(c: &mut Criterion) {
    let source = deck_source(300);
    let changes = PropertyChanges::new().position(50.0, 80.0);

    c.bench_function("patch_geometry_last_element", |b| {
        b.iter(|| patch(black_box(&source), black_box(301), black_box(&changes)))
    });
}

fn patch_noop(c: &mut Criterion) {
    let source = deck_source(300);
    let changes = PropertyChanges::new().style("width", "200px");

    c.bench_function("patch_noop", |b| {
        b.iter(|| patch(black_box(&source), black_box(150), black_box(&changes)))
    });
}

fn bindings(c: &mut Criterion) {
    let source = deck_source(300);

    c.bench_function("extract_bindings", |b| {
        b.iter(|| extract_bindings(black_box(&source)))
    });
}

criterion_group!(benches, patch_geometry, patch_noop, bindings);
criterion_main!(benches);
