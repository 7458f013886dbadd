use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagecraft_compiler_css::{compile_styles, StyleOptions};
use pagecraft_document::{Document, Node, NodeId};
use pagecraft_schema::{standard_registry, Props};
use serde_json::json;

fn page(sections: usize) -> Document {
    let mut roots = Vec::new();
    let mut nodes = Vec::new();

    for i in 0..sections {
        let section_id = NodeId::new(format!("s{}", i));
        let heading_id = NodeId::new(format!("h{}", i));

        let mut section = Node::new(section_id.clone(), "Section").with_props(
            serde_json::from_value::<Props>(json!({
                "style": {
                    "padding": 16 * (i % 4),
                    "background": "#ffffff",
                    "@media (max-width: 600px)": { "padding": 8 }
                }
            }))
            .unwrap(),
        );
        section.children.push(heading_id.clone());

        let mut heading = Node::new(heading_id, "Heading").with_props(
            serde_json::from_value::<Props>(json!({
                "text": format!("Section {}", i),
                "style": { "fontSize": 24 + (i % 3) * 4, "fontWeight": 700 }
            }))
            .unwrap(),
        );
        heading.parent_id = Some(section_id.clone());
        heading.zone_id = Some("body".to_string());

        roots.push(section_id);
        nodes.push(section);
        nodes.push(heading);
    }

    Document::from_parts(roots, nodes)
}

fn compile_small_page(c: &mut Criterion) {
    let registry = standard_registry();
    let doc = page(5);
    let options = StyleOptions::default();

    c.bench_function("compile_small_page", |b| {
        b.iter(|| compile_styles(black_box(&doc), &registry, &options))
    });
}

fn compile_large_page(c: &mut Criterion) {
    let registry = standard_registry();
    let doc = page(500);
    let options = StyleOptions::default();

    c.bench_function("compile_large_page", |b| {
        b.iter(|| compile_styles(black_box(&doc), &registry, &options))
    });
}

criterion_group!(benches, compile_small_page, compile_large_page);
criterion_main!(benches);
