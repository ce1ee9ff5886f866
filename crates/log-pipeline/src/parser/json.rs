//! JSON 라인 파서
//!
//! 한 줄짜리 JSON 객체를 파싱하여 스칼라 멤버를 필드로 노출합니다.
//!
//! # 필드 규칙
//! - 문자열/숫자/불리언 멤버만 필드가 됩니다 (`null`과 배열은 제외)
//! - 중첩 객체는 `_`로 이어 붙인 이름으로 평탄화됩니다 (예: `{"req":{"ms":3}}` → `req_ms`)
//! - 최상위가 객체가 아니거나 유효하지 않은 JSON이면 "no match"입니다

use std::borrow::Cow;

use serde_json::Value;

use linestat_core::pipeline::LineParser;
use linestat_core::types::{FieldMap, ParseOutcome};

/// 기본 최대 입력 크기 (1MB)
pub const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// 최대 평탄화 깊이
const MAX_DEPTH: usize = 8;

/// JSON 라인 파서
#[derive(Debug, Clone)]
pub struct JsonParser {
    /// 출력할 필드 (비어 있으면 전부)
    fields: Vec<String>,
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl JsonParser {
    /// 출력 필드를 제한하는 파서를 생성합니다. 빈 목록이면 모든 필드를 출력합니다.
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    fn wanted(&self, name: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == name)
    }

    fn flatten(
        &self,
        object: &serde_json::Map<String, Value>,
        prefix: &str,
        depth: usize,
        out: &mut FieldMap<'_>,
    ) {
        for (key, value) in object {
            let name = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}_{key}")
            };

            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Object(inner) => {
                    if depth < MAX_DEPTH {
                        self.flatten(inner, &name, depth + 1, out);
                    }
                    continue;
                }
                Value::Null | Value::Array(_) => continue,
            };

            if self.wanted(&name) {
                out.insert(Cow::Owned(name), Cow::Owned(text));
            }
        }
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LineParser for JsonParser {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn parse<'a>(&'a self, line: &'a str) -> ParseOutcome<'a> {
        if line.len() > self.max_input_size {
            tracing::trace!(len = line.len(), max = self.max_input_size, "json line too large");
            return ParseOutcome::NoMatch;
        }

        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(line) else {
            return ParseOutcome::NoMatch;
        };

        let mut fields = FieldMap::with_capacity(object.len());
        self.flatten(&object, "", 0, &mut fields);
        ParseOutcome::Matched(fields)
    }

    fn provides(&self, field: &str) -> bool {
        // 필드 집합은 라인마다 다르므로 제한이 없을 때는 어떤 이름이든 허용
        self.wanted(field)
    }
}
