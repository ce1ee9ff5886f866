//! 라인 파서 모듈 -- 정규식, JSON, 통과 파서
//!
//! 파서 종류는 닫힌 집합([`ParserKind`])이며, 설정 검증 후
//! [`CompiledParser`]로 한 번 컴파일되어 모든 라인에 재사용됩니다.
//! 각 파서는 core의 [`LineParser`] trait을 구현합니다.
//!
//! # 지원 종류
//! - `regex`: 이름 있는 캡처 그룹 ([`RegexParser`])
//! - `json`: 한 줄 JSON 객체 ([`JsonParser`])
//! - `passthru`: 라인 전체를 `line` 필드로 ([`PassthruParser`])
//!
//! # 사용 예시
//! ```ignore
//! use linestat_log_pipeline::parser::ParserKind;
//!
//! let kind = ParserKind::from_name("regex").unwrap();
//! let params = Validator::new().validate(&kind.schema(), &raw)?;
//! let parser = kind.compile("access", params.as_map().unwrap())?;
//! ```

pub mod json;
pub mod passthru;
pub mod regex;

pub use json::JsonParser;
pub use passthru::PassthruParser;
pub use regex::RegexParser;

use std::fmt;

use linestat_core::pipeline::LineParser;
use linestat_core::schema::{SchemaNode, ValidatedMap};
use linestat_core::types::ParseOutcome;

use crate::error::LogPipelineError;

/// 파서 섹션에서 모듈 파라미터가 아닌 예약 키
///
/// `kind`는 모듈 종류, `processors`는 라우팅 테이블입니다.
pub const RESERVED_KEYS: [&str; 2] = ["kind", "processors"];

/// 파서 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    /// 정규식 캡처 그룹
    Regex,
    /// JSON 객체
    Json,
    /// 라인 전체 통과
    Passthru,
}

impl ParserKind {
    /// 모든 파서 종류
    pub const ALL: [ParserKind; 3] = [Self::Regex, Self::Json, Self::Passthru];

    /// 설정 이름으로 종류를 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// 설정에서 사용하는 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Json => "json",
            Self::Passthru => "passthru",
        }
    }

    /// `--list-modules`에 표시되는 설명
    pub fn description(self) -> &'static str {
        match self {
            Self::Regex => "extracts named capture groups of a regular expression",
            Self::Json => "parses one JSON object per line and exposes its scalar members",
            Self::Passthru => "matches every line and exposes it as the field 'line'",
        }
    }

    /// 모듈 파라미터 스키마 (예약 키 제외)
    pub fn schema(self) -> SchemaNode {
        let fields = SchemaNode::list(SchemaNode::string()).optional();
        match self {
            Self::Regex => SchemaNode::map()
                .field("regex", SchemaNode::string())
                .field("fields", fields),
            Self::Json => SchemaNode::map()
                .field("fields", fields)
                .field(
                    "max_input_size",
                    SchemaNode::number().with_default(json::DEFAULT_MAX_INPUT_SIZE as f64),
                ),
            Self::Passthru => SchemaNode::map(),
        }
    }

    /// 검증된 파라미터로 파서를 컴파일합니다.
    ///
    /// `params`는 [`schema`](Self::schema)로 검증된 맵이어야 합니다.
    pub fn compile(
        self,
        parser: &str,
        params: &ValidatedMap,
    ) -> Result<CompiledParser, LogPipelineError> {
        let fields: Vec<String> = params
            .list("fields")
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();

        let compiled = match self {
            Self::Regex => {
                let pattern = params.str("regex").unwrap_or_default();
                CompiledParser::Regex(RegexParser::compile(parser, pattern, &fields)?)
            }
            Self::Json => {
                let max = params
                    .number("max_input_size")
                    .map(|n| n.max(0.0) as usize)
                    .unwrap_or(json::DEFAULT_MAX_INPUT_SIZE);
                CompiledParser::Json(JsonParser::new(fields).with_max_input_size(max))
            }
            Self::Passthru => CompiledParser::Passthru(PassthruParser),
        };

        tracing::debug!(parser, kind = self.name(), "parser compiled");
        Ok(compiled)
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 컴파일된 파서
#[derive(Debug, Clone)]
pub enum CompiledParser {
    /// 정규식
    Regex(RegexParser),
    /// JSON
    Json(JsonParser),
    /// 통과
    Passthru(PassthruParser),
}

impl LineParser for CompiledParser {
    fn kind(&self) -> &'static str {
        match self {
            Self::Regex(p) => p.kind(),
            Self::Json(p) => p.kind(),
            Self::Passthru(p) => p.kind(),
        }
    }

    fn parse<'a>(&'a self, line: &'a str) -> ParseOutcome<'a> {
        match self {
            Self::Regex(p) => p.parse(line),
            Self::Json(p) => p.parse(line),
            Self::Passthru(p) => p.parse(line),
        }
    }

    fn provides(&self, field: &str) -> bool {
        match self {
            Self::Regex(p) => p.provides(field),
            Self::Json(p) => p.provides(field),
            Self::Passthru(p) => p.provides(field),
        }
    }
}
