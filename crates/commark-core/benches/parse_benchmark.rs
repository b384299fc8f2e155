//! Benchmarks comparing commark parsing and rendering with pulldown-cmark
//!
//! Run with: cargo bench -p commark-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use commark_core::{parse_document, render_commonmark, render_html, Options as CmOptions, Parser};
use pulldown_cmark::{html, Options, Parser as MdParser};

const MARKDOWN_SAMPLE: &str = r#"# Introduction

This is a paragraph with *emphasis*, **strong text**, and `inline code`.
It demonstrates the basic capabilities of the format, with a
[reference link][ref] and an autolink <https://example.com>.

## Lists

- First item with some content
- Second item with more content
- Third item concluding the list

1. Step one of the process
2. Step two continues
3. Step three completes

## Code Example

```rust
fn fibonacci(n: u64) -> u64 {
    match n {
        0 => 0,
        1 => 1,
        _ => fibonacci(n - 1) + fibonacci(n - 2),
    }
}
```

## Quote

> The best code is no code at all.
> Every line of code you write is a liability.
>
> -- Someone wise

<div class="note">
Raw HTML passes through.
</div>

---

End of document with a hard
break and some &amp; entities &copy;.

[ref]: https://example.com/ref "Reference"
"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(MARKDOWN_SAMPLE.len() as u64));

    group.bench_function("commark", |b| {
        b.iter(|| {
            let tree = parse_document(black_box(MARKDOWN_SAMPLE), CmOptions::default()).unwrap();
            black_box(tree.len())
        })
    });

    group.bench_function("commark_streamed", |b| {
        b.iter(|| {
            let mut parser = Parser::new(CmOptions::default()).unwrap();
            for chunk in black_box(MARKDOWN_SAMPLE.as_bytes()).chunks(64) {
                parser.feed(chunk);
            }
            black_box(parser.finish().len())
        })
    });

    group.bench_function("pulldown_cmark", |b| {
        b.iter(|| {
            let parser = MdParser::new_ext(black_box(MARKDOWN_SAMPLE), Options::empty());
            let events: Vec<_> = parser.collect();
            black_box(events.len())
        })
    });

    group.finish();
}

fn bench_html(c: &mut Criterion) {
    let mut group = c.benchmark_group("html");
    group.throughput(Throughput::Bytes(MARKDOWN_SAMPLE.len() as u64));

    group.bench_function("commark", |b| {
        b.iter(|| {
            let options = CmOptions::default();
            let tree = parse_document(black_box(MARKDOWN_SAMPLE), options).unwrap();
            black_box(render_html(&tree, &options))
        })
    });

    group.bench_function("pulldown_cmark", |b| {
        b.iter(|| {
            let parser = MdParser::new_ext(black_box(MARKDOWN_SAMPLE), Options::empty());
            let mut out = String::new();
            html::push_html(&mut out, parser);
            black_box(out)
        })
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for size in [1, 5, 10, 20].iter() {
        let content: String = MARKDOWN_SAMPLE.repeat(*size);
        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("commark", size), &content, |b, content| {
            b.iter(|| {
                let tree = parse_document(black_box(content), CmOptions::default()).unwrap();
                black_box(tree.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("pulldown_cmark", size), &content, |b, content| {
            b.iter(|| {
                let parser = MdParser::new_ext(black_box(content), Options::empty());
                let events: Vec<_> = parser.collect();
                black_box(events.len())
            })
        });
    }

    group.finish();
}

fn bench_inline_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline");
    let inline = "This has *emphasis*, **strong**, `code`, [link](https://example.com), \
                  _under_ ***both*** and ![img](a.png \"t\").\n"
        .repeat(50);

    group.bench_function("commark", |b| {
        b.iter(|| {
            let tree = parse_document(black_box(&inline), CmOptions::default()).unwrap();
            black_box(tree.len())
        })
    });

    group.bench_function("pulldown_cmark", |b| {
        b.iter(|| {
            let parser = MdParser::new_ext(black_box(&inline), Options::empty());
            let events: Vec<_> = parser.collect();
            black_box(events.len())
        })
    });

    group.finish();
}

fn bench_commonmark_roundtrip(c: &mut Criterion) {
    let options = CmOptions::default();
    let tree = parse_document(MARKDOWN_SAMPLE, options).unwrap();

    c.bench_function("render_commonmark", |b| {
        b.iter(|| black_box(render_commonmark(black_box(&tree), &options, 72)))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_html,
    bench_scaling,
    bench_inline_heavy,
    bench_commonmark_roundtrip
);
criterion_main!(benches);
