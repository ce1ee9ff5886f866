//! 라인 파서 벤치마크
//!
//! 정규식/JSON 파서와 전체 파이프라인의 라인 처리량을 측정합니다.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use linestat_core::LinestatConfig;
use linestat_core::pipeline::LineParser;
use linestat_log_pipeline::parser::{JsonParser, RegexParser};
use linestat_log_pipeline::{DiscardSink, LinePipeline};

/// 두 글자 캡처 패턴 (랜덤 라인에서 가끔 매칭)
const SHORT_PATTERN: &str = "(?<first>[a-z])(?<second>[0-9])";

/// 접근 로그 패턴
const ACCESS_PATTERN: &str =
    r#"^(?<ip>\S+) \S+ \S+ \[[^\]]+\] "(?<method>[A-Z]+) (?<path>\S+)[^"]*" (?<status>[0-9]{3}) (?<bytes>[0-9]+)"#;

const ACCESS_LINE: &str =
    r#"203.0.113.45 - - [15/Jan/2024:12:00:00 +0000] "GET /api/v1/users HTTP/1.1" 200 5123"#;

const JSON_LINE: &str = r#"{"route":"users","status":200,"ms":12.5,"http":{"method":"GET"}}"#;

/// 결정적 의사 난수 라인 생성 (xorshift)
fn random_lines(count: usize, len: usize) -> Vec<String> {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 .-:/";
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..count)
        .map(|_| {
            (0..len)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    ALPHABET[(state % ALPHABET.len() as u64) as usize] as char
                })
                .collect()
        })
        .collect()
}

fn bench_regex(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex_parser");

    let short = RegexParser::compile("bench", SHORT_PATTERN, &[]).unwrap();
    for len in [16usize, 64, 256] {
        let lines = random_lines(1000, len);
        group.throughput(Throughput::Bytes((len * lines.len()) as u64));
        group.bench_with_input(BenchmarkId::new("random_lines", len), &lines, |b, lines| {
            b.iter(|| {
                for line in lines {
                    black_box(short.parse(black_box(line)));
                }
            })
        });
    }

    let access = RegexParser::compile("bench", ACCESS_PATTERN, &[]).unwrap();
    group.throughput(Throughput::Elements(1));
    group.bench_function("access_log", |b| {
        b.iter(|| black_box(access.parse(black_box(ACCESS_LINE))))
    });

    group.finish();
}

fn bench_json(c: &mut Criterion) {
    let parser = JsonParser::default();
    let mut group = c.benchmark_group("json_parser");
    group.throughput(Throughput::Elements(1));
    group.bench_function("flat_and_nested", |b| {
        b.iter(|| black_box(parser.parse(black_box(JSON_LINE))))
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let toml = format!(
        r#"
[processors.statsd]
kind = "statsd"
prefix = "web"
host = "127.0.0.1"

[parsers.access]
kind = "regex"
regex = '{ACCESS_PATTERN}'

[[parsers.access.processors.statsd.keys]]
type = "counter"
key = "status.{{status}}"
value = 1

[[parsers.access.processors.statsd.keys]]
type = "gauge"
key = "bytes"
value = "{{bytes}}"
"#
    );
    let config = LinestatConfig::parse(&toml).unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pipeline = runtime
        .block_on(
            LinePipeline::builder(&config)
                .sink("statsd", Arc::new(DiscardSink))
                .build(),
        )
        .unwrap();

    let mut group = c.benchmark_group("line_pipeline");
    group.throughput(Throughput::Elements(1));
    group.bench_function("access_log_two_metrics", |b| {
        b.iter(|| pipeline.process_line(black_box(ACCESS_LINE)))
    });
    group.finish();
}

criterion_group!(benches, bench_regex, bench_json, bench_pipeline);
criterion_main!(benches);
