//! 템플릿 해석 -- 설정 값의 `{field}` 참조를 라인별 필드 값으로 치환
//!
//! 템플릿은 설정 검증 시점에 한 번만 파싱되어 작은 AST([`Template`])로 저장됩니다.
//! 라인 처리 시에는 파싱 없이 치환만 수행합니다.
//!
//! # 문법
//! - `{name}`: 필드 참조. `name`은 `[A-Za-z_][A-Za-z0-9_]*`
//! - 그 외 텍스트는 리터럴
//! - 닫히지 않은 `{`, 단독 `}`, 빈 `{}`, 잘못된 이름은 파싱 에러
//!
//! # 해석 규칙
//! 참조된 필드 중 하나라도 필드 맵에 없으면 결과는 `None`(Absent)입니다.
//! 이는 에러가 아니며, 호출자는 해당 메트릭만 건너뜁니다.

use std::borrow::Cow;

use crate::schema::Scalar;
use crate::types::FieldMap;

/// 바이트 크기 접미사 배수 (1024 기반)
const KIB: f64 = 1024.0;

/// 템플릿 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at offset {offset}")]
pub struct TemplateError {
    /// 실패 사유
    pub reason: String,
    /// 실패 위치 (바이트 오프셋)
    pub offset: usize,
}

/// 템플릿 구성 요소
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// 리터럴 텍스트
    Literal(String),
    /// 필드 참조
    Field(String),
}

/// 파싱된 문자열 템플릿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// 템플릿 문자열을 파싱합니다.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' => {
                    let start = offset + 1;
                    let end = loop {
                        match chars.next() {
                            Some((i, '}')) => break i,
                            Some((i, '{')) => {
                                return Err(TemplateError {
                                    reason: "nested '{'".to_owned(),
                                    offset: i,
                                });
                            }
                            Some(_) => continue,
                            None => {
                                return Err(TemplateError {
                                    reason: "unclosed '{'".to_owned(),
                                    offset,
                                });
                            }
                        }
                    };
                    let name = &source[start..end];
                    validate_field_name(name, start)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_owned()));
                }
                '}' => {
                    return Err(TemplateError {
                        reason: "unmatched '}'".to_owned(),
                        offset,
                    });
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    /// 원본 템플릿 문자열을 반환합니다.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 구성 요소를 반환합니다.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 필드 참조를 하나 이상 포함하는지 여부를 반환합니다.
    pub fn has_fields(&self) -> bool {
        self.field_names().next().is_some()
    }

    /// 참조하는 필드 이름을 순회합니다.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// 필드 맵으로 템플릿을 치환합니다.
    ///
    /// 참조 필드가 하나라도 없으면 `None`을 반환합니다.
    /// 단일 구성 요소 템플릿은 할당 없이 빌려서 반환합니다.
    pub fn resolve<'s>(&'s self, fields: &'s FieldMap<'_>) -> Option<Cow<'s, str>> {
        match self.segments.as_slice() {
            [] => Some(Cow::Borrowed("")),
            [Segment::Literal(text)] => Some(Cow::Borrowed(text)),
            [Segment::Field(name)] => fields.get(name).map(Cow::Borrowed),
            segments => {
                let mut out = String::with_capacity(self.source.len());
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => out.push_str(text),
                        Segment::Field(name) => out.push_str(fields.get(name)?),
                    }
                }
                Some(Cow::Owned(out))
            }
        }
    }
}

fn validate_field_name(name: &str, offset: usize) -> Result<(), TemplateError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        None => {
            return Err(TemplateError {
                reason: "empty field reference".to_owned(),
                offset,
            });
        }
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    };
    if valid {
        Ok(())
    } else {
        Err(TemplateError {
            reason: format!("invalid field name '{name}'"),
            offset,
        })
    }
}

/// 리터럴 또는 템플릿일 수 있는 설정 값
///
/// pattern-capable 슬롯의 검증 결과입니다. 필드 참조가 없는 문자열은
/// 검증 시점에 [`TemplateExpr::Literal`]로 정규화됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateExpr {
    /// 리터럴 스칼라
    Literal(Scalar),
    /// 필드 참조를 포함한 템플릿
    Template(Template),
}

impl TemplateExpr {
    /// 문자열 값으로 해석합니다.
    pub fn resolve_str<'s>(&'s self, fields: &'s FieldMap<'_>) -> Option<Cow<'s, str>> {
        match self {
            Self::Literal(Scalar::String(s)) => Some(Cow::Borrowed(s)),
            Self::Literal(other) => Some(Cow::Owned(other.to_string())),
            Self::Template(template) => template.resolve(fields),
        }
    }

    /// 숫자 값으로 해석합니다.
    ///
    /// 문자열은 [`parse_number`]로 변환되며 (바이트 크기 접미사 포함),
    /// 변환할 수 없으면 `None`입니다.
    pub fn resolve_number(&self, fields: &FieldMap<'_>) -> Option<f64> {
        match self {
            Self::Literal(Scalar::Number(n)) => Some(*n),
            Self::Literal(Scalar::String(s)) => parse_number(s),
            Self::Literal(Scalar::Bool(_)) => None,
            Self::Template(template) => parse_number(&template.resolve(fields)?),
        }
    }

    /// 참조하는 필드 이름을 순회합니다.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        let template = match self {
            Self::Template(t) => Some(t),
            Self::Literal(_) => None,
        };
        template.into_iter().flat_map(Template::field_names)
    }
}

/// 숫자 또는 바이트 크기 문자열을 `f64`로 변환합니다.
///
/// 접미사 `k`, `m`, `g`, `t`(대소문자 무관, 뒤에 `b` 허용)는 1024 기반 배수입니다.
/// 예: `"2k"` → 2048, `"1.5MB"` → 1572864. 변환할 수 없으면 `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }

    let lower = s.to_ascii_lowercase();
    let body = lower.strip_suffix('b').unwrap_or(&lower);
    let (digits, multiplier) = match body.as_bytes().last()? {
        b'k' => (&body[..body.len() - 1], KIB),
        b'm' => (&body[..body.len() - 1], KIB * KIB),
        b'g' => (&body[..body.len() - 1], KIB * KIB * KIB),
        b't' => (&body[..body.len() - 1], KIB * KIB * KIB * KIB),
        _ => return None,
    };

    // "inf", "nan" 등은 f64 파싱이 허용하므로 숫자 문자만 통과
    let digits = digits.trim_end();
    if digits.is_empty()
        || !digits
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-' || b == b'+')
    {
        return None;
    }
    let value = digits.parse::<f64>().ok()? * multiplier;
    value.is_finite().then_some(value)
}
