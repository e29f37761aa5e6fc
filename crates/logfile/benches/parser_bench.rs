//! 로그 파일 파서 벤치마크
//!
//! 라인 매칭, 파일 단위 파싱(plain/gzip), 시간순 정렬의 처리량을 측정합니다.

use std::io::Cursor;
use std::path::PathBuf;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use phonelab_logfile::estimator::count_lines;
use phonelab_logfile::{LogFileParser, default_registry, parse_file, sort_chronologically};

/// 단일 PhoneLab 라인
const LINE: &str = "b11f946936357340df00c1ff2c27617c81d5f38e 20 1425204000.17 2015-03-01 10:00:00.250000 871 874 V WifiStateMachine: event 17 seq=75096";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn bench_line_extract(c: &mut Criterion) {
    let formatter = default_registry()
        .detect(LINE)
        .expect("built-in formatter should match");

    let mut group = c.benchmark_group("line_extract");
    group.throughput(Throughput::Elements(1));
    group.bench_function("phonelab", |b| {
        b.iter(|| formatter.extract(black_box(LINE), 17).unwrap().unwrap())
    });
    group.finish();
}

fn bench_parse_reader(c: &mut Criterion) {
    let parser = LogFileParser::new();
    let mut group = c.benchmark_group("parse_reader");

    for size in [100usize, 1000, 10_000] {
        let content: String = (0..size)
            .map(|i| format!("{}\n", LINE.replacen(".17 ", &format!(".{} ", i % 60_000), 1)))
            .collect();
        let lines = count_lines(content.as_bytes()).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| {
                parser
                    .parse_reader("bench", Cursor::new(black_box(content.as_bytes())), lines)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_parse_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_file");

    group.throughput(Throughput::Elements(1000));
    group.bench_function("plain_1000", |b| {
        b.iter(|| parse_file(black_box(fixture("20-1000.out"))).unwrap())
    });

    group.throughput(Throughput::Elements(2000));
    group.bench_function("gzip_2000", |b| {
        b.iter(|| parse_file(black_box(fixture("20-2000.out.gz"))).unwrap())
    });
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut records = parse_file(fixture("20-2000.out.gz")).unwrap();
    records.reverse();

    let mut group = c.benchmark_group("sort");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("reversed_2000", |b| {
        b.iter_batched(
            || records.clone(),
            |mut batch| sort_chronologically(&mut batch),
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_line_extract,
    bench_parse_reader,
    bench_parse_file,
    bench_sort
);
criterion_main!(benches);
