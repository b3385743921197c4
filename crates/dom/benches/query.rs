use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dom::{Document, MemoryDocument, SelectorList};

/// 200 sections x 10 items, every third item marked active
fn page() -> String {
    let mut html = String::with_capacity(64 * 1024);
    for s in 0..200 {
        html.push_str(&format!("<section id=\"s{}\"><ul class=\"list\">", s));
        for i in 0..10 {
            let class = if i % 3 == 0 { "item active" } else { "item" };
            html.push_str(&format!("<li class=\"{}\" data-i=\"{}\">{}</li>", class, i, i));
        }
        html.push_str("</ul></section>");
    }
    html
}

fn bench_query(c: &mut Criterion) {
    let doc = MemoryDocument::from_html(&page()).expect("bench page parses");

    c.bench_function("query_class", |b| {
        b.iter(|| doc.query_selector_all(black_box(".active")).unwrap())
    });

    c.bench_function("query_descendant_attr", |b| {
        b.iter(|| {
            doc.query_selector_all(black_box("section ul > li[data-i^='1']"))
                .unwrap()
        })
    });

    c.bench_function("parse_selector_list", |b| {
        b.iter(|| SelectorList::parse(black_box("div.a > p + span ~ em, #x [y|=z], li:first-child")).unwrap())
    });
}

fn bench_parse(c: &mut Criterion) {
    let html = page();
    c.bench_function("parse_page", |b| {
        b.iter(|| MemoryDocument::from_html(black_box(&html)).unwrap())
    });
}

criterion_group!(benches, bench_query, bench_parse);
criterion_main!(benches);
