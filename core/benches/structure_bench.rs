use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use crls_core::{blocks, infer, parse, text, Tokenizer};
use std::hint::black_box;

fn generate_source(classes: usize) -> String {
    let mut src = String::new();
    for i in 0..classes {
        src.push_str(&format!("class Model{i} < Base\n"));
        src.push_str("  property id : Int32\n  getter name : String\n\n");
        src.push_str(&format!("  def initialize(@id : Int32, @name : String = \"m{i}\")\n  end\n\n"));
        src.push_str("  def score(factor : Float64, bonus = 0) : Float64\n");
        src.push_str("    total = factor * 2\n    if total > 10\n      total = 10.0\n    end\n    total\n  end\n");
        src.push_str("end\n\n");
        src.push_str(&format!("item{i} = Model{i}.new({i}, \"x\")\nlabel{i} = \"item #{{item{i}.id}}\"\n\n"));
    }
    src
}

fn bench_structure(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure");
    for classes in [10usize, 100] {
        let src = generate_source(classes);
        group.bench_with_input(BenchmarkId::new("parse", classes), &src, |b, src| {
            b.iter(|| black_box(parse(src)))
        });
        group.bench_with_input(BenchmarkId::new("tokenize", classes), &src, |b, src| {
            b.iter(|| black_box(Tokenizer::tokenize(src)))
        });
        group.bench_with_input(BenchmarkId::new("block_scan", classes), &src, |b, src| {
            b.iter(|| {
                let lines = text::split_lines(src);
                black_box(blocks::scan(&lines))
            })
        });
    }
    group.finish();
}

fn bench_variable_lookup(c: &mut Criterion) {
    let src = generate_source(100);
    let table = parse(&src);
    let lines = text::split_lines(&src);
    let ctx = infer::InferContext {
        table: &table,
        lines: &lines,
        line: lines.len() - 1,
        lookback: infer::DEFAULT_LOOKBACK_LINES,
    };
    c.bench_function("find_variable_type_miss", |b| {
        b.iter(|| black_box(infer::find_variable_type("missing", &ctx)))
    });
    c.bench_function("infer_chain", |b| b.iter(|| black_box(infer::infer_expression_type("item99.id", &ctx))));
}

criterion_group!(benches, bench_structure, bench_variable_lookup);
criterion_main!(benches);
