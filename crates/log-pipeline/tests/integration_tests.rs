//! 통합 테스트 -- 설정 파싱부터 메트릭 전송까지 전체 흐름 검증

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use linestat_core::LinestatConfig;
use linestat_core::error::SchemaError;
use linestat_log_pipeline::{Emission, LinePipeline, LogPipelineError, MemorySink};

/// 두 필드를 캡처하는 접근 로그 설정
const ACCESS_CONFIG: &str = r#"
[processors.statsd]
kind = "statsd"
prefix = "web"
host = "127.0.0.1"

[parsers.access]
kind = "regex"
regex = '(?<status>[0-9]{3}) (?<bytes>[0-9]+)'

[[parsers.access.processors.statsd.keys]]
type = "counter"
key = "status.{status}"
value = 1
multiplier = 1

[[parsers.access.processors.statsd.keys]]
type = "gauge"
key = "bytes"
value = "{bytes}"
multiplier = 1
"#;

async fn pipeline_with_memory_sink(toml: &str) -> (LinePipeline, Arc<MemorySink>) {
    let config = LinestatConfig::parse(toml).expect("config parses");
    let sink = Arc::new(MemorySink::default());
    let pipeline = LinePipeline::builder(&config)
        .sink("statsd", sink.clone())
        .build()
        .await
        .expect("pipeline builds");
    (pipeline, sink)
}

/// 매칭 라인 → 카운터와 게이지 전송
#[tokio::test]
async fn test_matching_line_end_to_end() {
    let (pipeline, sink) = pipeline_with_memory_sink(ACCESS_CONFIG).await;

    assert_eq!(pipeline.process_line("200 1024"), 1);

    assert_eq!(
        sink.emissions(),
        [
            Emission::increment("status.200", 1),
            Emission::gauge("bytes", 1024)
        ]
    );
}

/// 매칭되지 않는 라인 → 아무것도 전송하지 않음
#[tokio::test]
async fn test_non_matching_line_end_to_end() {
    let (pipeline, sink) = pipeline_with_memory_sink(ACCESS_CONFIG).await;

    assert_eq!(pipeline.process_line("not a log line"), 0);

    assert!(sink.emissions().is_empty());
    assert_eq!(pipeline.lines_processed(), 1);
    assert_eq!(pipeline.lines_matched(), 0);
}

/// 선택 캡처가 빠진 라인 → 해당 정의만 건너뜀
#[tokio::test]
async fn test_absent_field_skips_only_that_definition() {
    let toml = r#"
[processors.statsd]
kind = "statsd"
prefix = "web"
host = "127.0.0.1"

[parsers.access]
kind = "regex"
regex = '(?<status>[0-9]{3})(?: (?<bytes>[0-9]+))?'

[[parsers.access.processors.statsd.keys]]
type = "counter"
key = "status.{status}"
value = 1

[[parsers.access.processors.statsd.keys]]
type = "gauge"
key = "bytes"
value = "{bytes}"
"#;
    let (pipeline, sink) = pipeline_with_memory_sink(toml).await;

    pipeline.process_line("304");

    assert_eq!(sink.emissions(), [Emission::increment("status.304", 1)]);
}

/// 패턴에 없는 필드 참조 → 기본 모드에서는 경고 후 해당 정의만 건너뜀
#[tokio::test]
async fn test_never_captured_field_skips_definition() {
    let toml = ACCESS_CONFIG.replace(
        "(?<status>[0-9]{3}) (?<bytes>[0-9]+)",
        "(?<status>[0-9]{3})",
    );
    let (pipeline, sink) = pipeline_with_memory_sink(&toml).await;

    pipeline.process_line("200 1024");

    assert_eq!(sink.emissions(), [Emission::increment("status.200", 1)]);
}

/// 바이트 크기 값과 배수 적용
#[tokio::test]
async fn test_byte_size_and_multiplier() {
    let toml = r#"
[processors.statsd]
kind = "statsd"
prefix = "app"
host = "127.0.0.1"

[parsers.transfer]
kind = "regex"
regex = 'sent (?<size>\S+) in (?<secs>[0-9.]+)s'

[[parsers.transfer.processors.statsd.keys]]
type = "gauge"
key = "transfer.size"
value = "{size}"

[[parsers.transfer.processors.statsd.keys]]
type = "timer"
key = "transfer.duration"
value = "{secs}"
multiplier = 1000
"#;
    let (pipeline, sink) = pipeline_with_memory_sink(toml).await;

    pipeline.process_line("sent 2k in 0.25s");
    pipeline.process_line("sent bogus in 1.5s");

    assert_eq!(
        sink.emissions(),
        [
            Emission::gauge("transfer.size", 2048),
            Emission::timing("transfer.duration", 250),
            Emission::timing("transfer.duration", 1500)
        ]
    );
}

/// JSON 설정 파일과 JSON 라인 파서
#[tokio::test]
async fn test_json_config_and_json_parser() {
    let json = r#"{
        "processors": {"statsd": {"kind": "statsd", "prefix": "api", "host": "127.0.0.1"}},
        "parsers": {
            "events": {
                "kind": "json",
                "processors": {"statsd": {"keys": [
                    {"type": "timer", "key": "latency.{route}", "value": "{ms}"}
                ]}}
            }
        }
    }"#;
    let config = LinestatConfig::parse_json(json).unwrap();
    let sink = Arc::new(MemorySink::default());
    let pipeline = LinePipeline::builder(&config)
        .sink("statsd", sink.clone())
        .build()
        .await
        .unwrap();

    pipeline.process_line(r#"{"route":"users","ms":42}"#);
    pipeline.process_line(r#"{"route":"users"}"#);
    pipeline.process_line("plain text");

    assert_eq!(sink.emissions(), [Emission::timing("latency.users", 42)]);
}

/// 설정 에러는 경로와 함께 빌드 시점에 보고됨
#[tokio::test]
async fn test_configuration_errors_are_path_qualified() {
    let cases = [
        (
            r#"
[processors.statsd]
kind = "statsd"
host = "127.0.0.1"

[parsers.p]
kind = "passthru"
"#,
            "processors.statsd.prefix",
        ),
        (
            r#"
[processors.statsd]
kind = "statsd"
prefix = "x"
host = "127.0.0.1"
port = "8125"

[parsers.p]
kind = "passthru"
"#,
            "processors.statsd.port",
        ),
        (
            r#"
[processors.statsd]
kind = "statsd"
prefix = "x"
host = "127.0.0.1"

[parsers.p]
kind = "passthru"

[[parsers.p.processors.statsd.keys]]
type = "counter"
key = "bad.{unclosed"
value = 1
"#,
            "parsers.p.processors.statsd.keys[0].key",
        ),
        (
            r#"
[processors.statsd]
kind = "statsd"
prefix = "x"
host = "127.0.0.1"

[parsers.p]
kind = "passthru"

[[parsers.p.processors.statsd.keys]]
type = "counter"
key = "hits"
value = 1

[[parsers.p.processors.statsd.keys]]
type = "gauge"
key = "level"
value = "bogus"
"#,
            "parsers.p.processors.statsd.keys[1].value",
        ),
    ];

    for (toml, expected_path) in cases {
        let config = LinestatConfig::parse(toml).unwrap();
        let err = LinePipeline::builder(&config)
            .dry_run(true)
            .build()
            .await
            .err()
            .expect("configuration must be rejected");
        match err {
            LogPipelineError::Schema(schema) => assert_eq!(schema.path(), expected_path),
            other => panic!("unexpected error for {expected_path}: {other}"),
        }
    }
}

/// 잘못된 정규식은 InvalidPattern
#[tokio::test]
async fn test_invalid_regex_is_rejected() {
    let toml = r#"
[parsers.broken]
kind = "regex"
regex = '(?<status>[0-9]{3}'
"#;
    let config = LinestatConfig::parse(toml).unwrap();
    let err = LinePipeline::builder(&config).build().await.err().unwrap();
    assert!(matches!(err, LogPipelineError::InvalidPattern { ref parser, .. } if parser == "broken"));
}

/// malformed 템플릿은 MalformedTemplate
#[tokio::test]
async fn test_malformed_template_variant() {
    let toml = r#"
[processors.statsd]
kind = "statsd"
prefix = "x"
host = "127.0.0.1"

[parsers.p]
kind = "passthru"

[[parsers.p.processors.statsd.keys]]
type = "counter"
key = "a.{}"
value = 1
"#;
    let config = LinestatConfig::parse(toml).unwrap();
    let err = LinePipeline::builder(&config)
        .dry_run(true)
        .build()
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        LogPipelineError::Schema(SchemaError::MalformedTemplate { .. })
    ));
}

/// 실제 UDP로 StatsD 패킷 전송
#[tokio::test]
async fn test_statsd_over_udp() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    let toml = ACCESS_CONFIG.replace(
        "host = \"127.0.0.1\"",
        &format!("host = \"127.0.0.1\"\nport = {port}"),
    );
    let config = LinestatConfig::parse(&toml).unwrap();
    let pipeline = LinePipeline::builder(&config).build().await.unwrap();

    pipeline.process_line("503 77");
    pipeline.shutdown().await;

    let mut buf = [0u8; 512];
    let mut received = Vec::new();
    for _ in 0..2 {
        let n = tokio::time::timeout(Duration::from_secs(5), server.recv(&mut buf))
            .await
            .expect("datagram within timeout")
            .unwrap();
        received.push(String::from_utf8_lossy(&buf[..n]).into_owned());
    }
    assert_eq!(received, ["web.status.503:1|c", "web.bytes:77|g"]);
}

/// 많은 라인을 처리해도 카운터만 증가
#[tokio::test]
async fn test_many_lines() {
    let (pipeline, sink) = pipeline_with_memory_sink(ACCESS_CONFIG).await;

    for i in 0..1000 {
        let line = if i % 2 == 0 {
            format!("200 {i}")
        } else {
            "garbage".to_owned()
        };
        pipeline.process_line(&line);
    }

    assert_eq!(pipeline.lines_processed(), 1000);
    assert_eq!(pipeline.lines_matched(), 500);
    assert_eq!(sink.emissions().len(), 1000);
}
