//! Benchmarks for editor syntax highlighting.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mermaid_studio::highlight::highlight_line;
use mermaid_studio::templates::TEMPLATES;

fn bench_highlight_line(c: &mut Criterion) {
    let line = r#"    A[Start] -->|"yes, go"| B{Is it?} %% decision"#;
    c.bench_function("highlight_line", |b| {
        b.iter(|| highlight_line(black_box(line)))
    });
}

fn bench_highlight_templates(c: &mut Criterion) {
    let lines: Vec<&str> = TEMPLATES.iter().flat_map(|t| t.source.lines()).collect();
    c.bench_function("highlight_all_templates", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(highlight_line(line));
            }
        });
    });
}

criterion_group!(benches, bench_highlight_line, bench_highlight_templates);
criterion_main!(benches);
