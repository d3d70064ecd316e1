use criterion::{Criterion, criterion_group, criterion_main};
use pamlwick::paml::{PamlParserBuilder, ReadStrategy};

const REGRESSION_REPORTS: &[(&str, &str)] = &[
    ("codeml+rst", "tests/fixtures/codeml/mlc"),
    ("baseml", "tests/fixtures/baseml/mlb"),
    ("yn00", "tests/fixtures/yn00/yn"),
];

fn parse_report(path: &str, strategy: ReadStrategy) {
    let mut parser = PamlParserBuilder::for_file(path)
        .unwrap()
        .with_read_strategy(strategy)
        .build()
        .unwrap();

    while let Some(_result) = parser.next_result().unwrap() {
        // consume all runs
    }
}

fn report_parsing(c: &mut Criterion) {
    for (name, path) in REGRESSION_REPORTS {
        c.bench_function(name, |b| {
            b.iter(|| parse_report(path, ReadStrategy::Automatic));
        });
    }
}

fn read_strategies(c: &mut Criterion) {
    let (_, path) = REGRESSION_REPORTS[0];
    c.bench_function("buffered", |b| {
        b.iter(|| parse_report(path, ReadStrategy::Buffered));
    });
    c.bench_function("in-memory", |b| {
        b.iter(|| parse_report(path, ReadStrategy::InMemory));
    });
}

criterion_group!(regression, report_parsing);
criterion_group! {
    name = reporting;
    config = Criterion::default().sample_size(10);
    targets = read_strategies
}
criterion_main!(regression, reporting);
