#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use linestat_core::pipeline::LineParser;
use linestat_log_pipeline::parser::RegexParser;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 임의 패턴 (대부분 컴파일 실패)
    pattern: String,
    /// 매칭 대상 라인 (최대 16개 사용)
    lines: Vec<String>,
}

const ACCESS_LOG: &str =
    r#""(?<method>[A-Z]+) (?<path>[^ "]*)[^"]*" (?<status>[0-9]{3}) (?<bytes>[0-9]+)(?: (?<secs>[0-9.]+))?"#;

fuzz_target!(|input: FuzzInput| {
    // 고정 패턴: 임의 라인에서 panic 없이 매칭/비매칭만
    if let Ok(parser) = RegexParser::compile("fuzz", ACCESS_LOG, &[]) {
        for line in input.lines.iter().take(16) {
            if let Some(fields) = parser.parse(line).into_fields() {
                assert!(fields.iter().all(|(name, _)| parser.provides(name)));
            }
        }
    }

    // 임의 패턴: 컴파일 에러는 허용, panic은 불허
    if let Ok(parser) = RegexParser::compile("fuzz", &input.pattern, &[]) {
        for line in input.lines.iter().take(16) {
            let _ = parser.parse(line);
        }
    }
});
