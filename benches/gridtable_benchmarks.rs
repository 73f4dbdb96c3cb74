use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridtable::*;

fn make_table(size: usize) -> Table {
    let regions = ["north", "south", "east", "west"];
    let records = (0..size)
        .map(|i| {
            record! {
                "id" => format!("ord-{}", i),
                "region" => regions[i % regions.len()],
                "amount" => (i as f64 * 7.25) % 1000.0,
                "quantity" => (i % 50) as i64,
                "shipped" => i % 3 == 0,
                "created" => format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
            }
        })
        .collect();
    Table::new("orders", records)
}

fn bench_type_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_inference");

    for size in [100, 1000].iter() {
        let table = make_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| infer_column_types(black_box(table.sample()), table.columns()));
        });
    }
    group.finish();
}

fn bench_numeric_filter_parse(c: &mut Criterion) {
    c.bench_function("parse_numeric_filter", |b| {
        b.iter(|| {
            for input in ["> 10", "-5 <> 20", "<= -3.5", "42", "abc"] {
                black_box(parse_numeric_filter(black_box(input)));
            }
        });
    });
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [1000, 10000, 100000].iter() {
        let table = make_table(*size);
        let types = infer_column_types(table.sample(), table.columns());
        let filters = FilterState::new()
            .with("amount", "100 <> 600")
            .with("region", "th")
            .with("shipped", true);
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| evaluator.apply(black_box(table.records())));
        });
    }
    group.finish();
}

fn bench_multi_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_sort");

    for size in [1000, 10000, 100000].iter() {
        let table = make_table(*size);
        let types = infer_column_types(table.sample(), table.columns());
        let indices: Vec<usize> = (0..table.len()).collect();
        let spec = SortSpec::new(vec![SortKey::ascending("region"), SortKey::descending("amount")]);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| sort_indices(table.records(), black_box(&indices), &spec, &types));
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for size in [1000, 10000].iter() {
        let table = make_table(*size);
        let filters = FilterState::new().with("quantity", ">= 10");
        let sort = SortSpec::new(vec![SortKey::descending("amount")]);

        group.bench_with_input(BenchmarkId::new("cold", size), size, |b, _| {
            b.iter(|| {
                let mut pipeline = Pipeline::new(GridConfig::default());
                pipeline.run(&table, &filters, &sort, Page::default()).unwrap()
            });
        });

        let mut pipeline = Pipeline::new(GridConfig::default());
        group.bench_with_input(BenchmarkId::new("paging", size), size, |b, _| {
            let mut page = 0;
            b.iter(|| {
                page = (page + 1) % 50;
                pipeline.run(&table, &filters, &sort, Page::new(page * 10, 10)).unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_type_inference,
    bench_numeric_filter_parse,
    bench_filter,
    bench_multi_sort,
    bench_pipeline
);
criterion_main!(benches);
