//! 정규식 라인 파서
//!
//! 이름 있는 캡처 그룹(`(?<name>...)` 또는 `(?P<name>...)`)을 필드로 추출합니다.
//! `regex` 크레이트는 입력 길이에 선형인 매칭을 보장하므로 백트래킹 폭주가 없습니다.
//!
//! # 사용 예시
//! ```
//! use linestat_core::pipeline::LineParser;
//! use linestat_log_pipeline::parser::RegexParser;
//!
//! let parser = RegexParser::compile("access", "(?<status>[0-9]{3}) (?<bytes>[0-9]+)", &[]).unwrap();
//! let fields = parser.parse("200 1024").into_fields().unwrap();
//! assert_eq!(fields.get("status"), Some("200"));
//! assert_eq!(fields.get("bytes"), Some("1024"));
//! ```

use regex::Regex;

use linestat_core::pipeline::LineParser;
use linestat_core::types::{FieldMap, ParseOutcome};

use crate::error::LogPipelineError;

/// 컴파일된 정규식 파서
///
/// 불변이며 매칭 상태를 공유하지 않으므로 여러 스레드에서 동시에 사용할 수 있습니다.
#[derive(Debug, Clone)]
pub struct RegexParser {
    regex: Regex,
    /// (캡처 그룹 인덱스, 필드명) -- 출력할 필드만 포함
    fields: Vec<(usize, String)>,
}

impl RegexParser {
    /// 패턴을 컴파일합니다.
    ///
    /// `declared`가 비어 있으면 모든 이름 있는 캡처 그룹을 출력하고,
    /// 그렇지 않으면 선언된 필드만 출력합니다.
    ///
    /// # Errors
    /// - 패턴이 유효한 정규식이 아니면 [`LogPipelineError::InvalidPattern`]
    /// - 선언된 필드가 패턴에 없는 캡처 이름이면 [`LogPipelineError::UnknownFieldReference`]
    pub fn compile(
        parser: &str,
        pattern: &str,
        declared: &[String],
    ) -> Result<Self, LogPipelineError> {
        let regex = Regex::new(pattern).map_err(|e| LogPipelineError::InvalidPattern {
            parser: parser.to_owned(),
            reason: e.to_string(),
        })?;

        let captures: Vec<(usize, &str)> = regex
            .capture_names()
            .enumerate()
            .filter_map(|(idx, name)| name.map(|n| (idx, n)))
            .collect();

        let fields = if declared.is_empty() {
            captures
                .iter()
                .map(|(idx, name)| (*idx, (*name).to_owned()))
                .collect()
        } else {
            let mut fields = Vec::with_capacity(declared.len());
            for (pos, field) in declared.iter().enumerate() {
                let Some((idx, _)) = captures.iter().find(|(_, name)| name == field) else {
                    return Err(LogPipelineError::UnknownFieldReference {
                        parser: parser.to_owned(),
                        field: field.clone(),
                        path: format!("parsers.{parser}.fields[{pos}]"),
                    });
                };
                fields.push((*idx, field.clone()));
            }
            fields
        };

        if fields.is_empty() {
            tracing::warn!(parser, pattern, "regex has no named capture groups");
        }

        Ok(Self { regex, fields })
    }

    /// 원본 패턴 문자열
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// 출력 필드명 목록 (캡처 그룹 순서)
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, name)| name.as_str())
    }
}

impl LineParser for RegexParser {
    fn kind(&self) -> &'static str {
        "regex"
    }

    fn parse<'a>(&'a self, line: &'a str) -> ParseOutcome<'a> {
        let Some(caps) = self.regex.captures(line) else {
            return ParseOutcome::NoMatch;
        };

        let mut fields = FieldMap::with_capacity(self.fields.len());
        for (idx, name) in &self.fields {
            // 참여하지 않은 선택 그룹은 필드 누락으로 취급
            if let Some(m) = caps.get(*idx) {
                fields.insert(name.as_str(), m.as_str());
            }
        }
        ParseOutcome::Matched(fields)
    }

    fn provides(&self, field: &str) -> bool {
        self.fields.iter().any(|(_, name)| name == field)
    }
}
