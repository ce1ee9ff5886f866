//! 스키마 검증기 -- 원시 설정 트리를 스키마에 맞춰 검증/정규화합니다.
//!
//! 검증은 부수 효과가 없는 순수 변환이며, 라인 처리 전 시작 시점에 한 번만 수행됩니다.
//! 첫 번째 실패에서 즉시 중단하고 경로가 포함된 [`SchemaError`]를 반환합니다.

use serde_json::Value;

use super::node::{Scalar, ScalarSpec, SchemaNode, ValueType};
use super::value::{Validated, ValidatedMap};
use crate::error::SchemaError;
use crate::template::{Template, TemplateExpr, parse_number};

/// 스키마 검증기
///
/// `strict`가 켜져 있으면 맵 스키마에 선언되지 않은 키를 거부합니다.
/// 기본값은 무시(forward-compatible)입니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    strict: bool,
}

impl Validator {
    /// 기본(non-strict) 검증기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// strict 모드를 설정합니다.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 루트 경로 없이 검증합니다.
    pub fn validate(&self, schema: &SchemaNode, raw: &Value) -> Result<Validated, SchemaError> {
        self.validate_at(schema, raw, "")
    }

    /// 지정한 경로를 루트로 하여 검증합니다.
    ///
    /// `path`는 에러 메시지에 사용됩니다 (예: `"processors.statsd"`).
    pub fn validate_at(
        &self,
        schema: &SchemaNode,
        raw: &Value,
        path: &str,
    ) -> Result<Validated, SchemaError> {
        match self.node(schema, Some(raw), path)? {
            Some(validated) => Ok(validated),
            // 루트가 null인 선택 스칼라
            None => Err(SchemaError::MissingRequiredField {
                path: display_path(path),
            }),
        }
    }

    fn node(
        &self,
        schema: &SchemaNode,
        raw: Option<&Value>,
        path: &str,
    ) -> Result<Option<Validated>, SchemaError> {
        let raw = raw.filter(|v| !v.is_null());

        match schema {
            SchemaNode::Scalar(spec) => Ok(scalar(spec, raw, path)?.map(Validated::Scalar)),

            SchemaNode::Enum { spec, allowed } => {
                let Some(value) = scalar(spec, raw, path)? else {
                    return Ok(None);
                };
                if !allowed.contains(&value) {
                    return Err(SchemaError::InvalidEnumValue {
                        path: display_path(path),
                        value: value.to_string(),
                        allowed: allowed
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", "),
                    });
                }
                Ok(Some(Validated::Scalar(value)))
            }

            SchemaNode::Pattern(spec) => {
                let Some(Value::String(source)) = raw else {
                    let literal = scalar(spec, raw, path)?;
                    return Ok(literal.map(|v| Validated::Template(TemplateExpr::Literal(v))));
                };
                let template =
                    Template::parse(source).map_err(|e| SchemaError::MalformedTemplate {
                        path: display_path(path),
                        template: source.clone(),
                        reason: e.to_string(),
                    })?;
                // 필드 참조가 있으면 선언 타입과 무관하게 템플릿으로 받음
                let expr = if template.has_fields() {
                    TemplateExpr::Template(template)
                } else {
                    TemplateExpr::Literal(string_literal(spec, source, path)?)
                };
                Ok(Some(Validated::Template(expr)))
            }

            SchemaNode::List { element, required } => {
                let Some(value) = raw else {
                    return missing(*required, path);
                };
                let Value::Array(items) = value else {
                    return Err(SchemaError::TypeMismatch {
                        path: display_path(path),
                        expected: "list".to_owned(),
                        found: json_type_name(value).to_owned(),
                    });
                };
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{idx}]");
                    if let Some(validated) = self.node(element, Some(item), &item_path)? {
                        out.push(validated);
                    }
                }
                Ok(Some(Validated::List(out)))
            }

            SchemaNode::Map { fields, required } => {
                let Some(value) = raw else {
                    return missing(*required, path);
                };
                let Value::Object(object) = value else {
                    return Err(SchemaError::TypeMismatch {
                        path: display_path(path),
                        expected: "map".to_owned(),
                        found: json_type_name(value).to_owned(),
                    });
                };

                for key in object.keys() {
                    if fields.iter().any(|(name, _)| name == key) {
                        continue;
                    }
                    if self.strict {
                        return Err(SchemaError::UnknownKey {
                            path: join(path, key),
                        });
                    }
                    tracing::debug!(path = %join(path, key), "ignoring unknown config key");
                }

                let mut out = ValidatedMap::default();
                for (name, child) in fields {
                    let child_path = join(path, name);
                    if let Some(validated) = self.node(child, object.get(name), &child_path)? {
                        out.insert(name.clone(), validated);
                    }
                }
                Ok(Some(Validated::Map(out)))
            }
        }
    }
}

/// 기본(non-strict) 검증기로 검증합니다.
pub fn validate(schema: &SchemaNode, raw: &Value) -> Result<Validated, SchemaError> {
    Validator::new().validate(schema, raw)
}

fn missing(required: bool, path: &str) -> Result<Option<Validated>, SchemaError> {
    if required {
        Err(SchemaError::MissingRequiredField {
            path: display_path(path),
        })
    } else {
        Ok(None)
    }
}

fn scalar(
    spec: &ScalarSpec,
    raw: Option<&Value>,
    path: &str,
) -> Result<Option<Scalar>, SchemaError> {
    let Some(value) = raw else {
        if spec.required {
            return Err(SchemaError::MissingRequiredField {
                path: display_path(path),
            });
        }
        return Ok(spec.default.clone());
    };

    let mismatch = || SchemaError::TypeMismatch {
        path: display_path(path),
        expected: spec.expected(),
        found: json_type_name(value).to_owned(),
    };

    let scalar = match value {
        Value::String(s) => Scalar::String(s.clone()),
        Value::Number(n) => Scalar::Number(n.as_f64().ok_or_else(mismatch)?),
        Value::Bool(b) => Scalar::Bool(*b),
        _ => return Err(mismatch()),
    };

    if !spec.types.contains(&scalar.value_type()) {
        return Err(mismatch());
    }

    Ok(Some(scalar))
}

/// 참조 없는 문자열 리터럴을 선언 타입으로 변환합니다.
///
/// 문자열을 받지 않는 숫자 슬롯이면 [`parse_number`]로 변환 가능해야 합니다 (`"2k"` 등).
fn string_literal(spec: &ScalarSpec, source: &str, path: &str) -> Result<Scalar, SchemaError> {
    if spec.types.contains(&ValueType::String) {
        return Ok(Scalar::String(source.to_owned()));
    }
    if spec.types.contains(&ValueType::Number) {
        if let Some(n) = parse_number(source) {
            return Ok(Scalar::Number(n));
        }
    }
    Err(SchemaError::TypeMismatch {
        path: display_path(path),
        expected: spec.expected(),
        found: format!("string '{source}'"),
    })
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_owned()
    } else {
        path.to_owned()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
