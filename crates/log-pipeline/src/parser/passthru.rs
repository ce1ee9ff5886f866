//! 통과 파서 -- 모든 라인을 `line` 필드 하나로 매칭합니다.

use linestat_core::pipeline::LineParser;
use linestat_core::types::{FieldMap, ParseOutcome};

/// 통과 파서가 만드는 유일한 필드명
pub const LINE_FIELD: &str = "line";

/// 통과 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthruParser;

impl LineParser for PassthruParser {
    fn kind(&self) -> &'static str {
        "passthru"
    }

    fn parse<'a>(&'a self, line: &'a str) -> ParseOutcome<'a> {
        let mut fields = FieldMap::with_capacity(1);
        fields.insert(LINE_FIELD, line);
        ParseOutcome::Matched(fields)
    }

    fn provides(&self, field: &str) -> bool {
        field == LINE_FIELD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_line_matches() {
        let fields = PassthruParser.parse("anything at all").into_fields().unwrap();
        assert_eq!(fields.get("line"), Some("anything at all"));
        assert!(PassthruParser.parse("").is_match());
    }

    #[test]
    fn provides_only_line() {
        assert!(PassthruParser.provides("line"));
        assert!(!PassthruParser.provides("status"));
    }
}
