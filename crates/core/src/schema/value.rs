//! 검증된 설정 값 트리
//!
//! [`validate`](super::validate)의 결과물입니다. 필수 슬롯은 모두 존재하고,
//! 기본값이 채워지며, enum 슬롯은 허용 값 중 하나임이 보장됩니다.

use std::collections::BTreeMap;

use super::node::Scalar;
use crate::template::TemplateExpr;

/// 검증된 값
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// 스칼라 (enum 포함)
    Scalar(Scalar),
    /// pattern-capable 슬롯 값
    Template(TemplateExpr),
    /// 리스트
    List(Vec<Validated>),
    /// 맵
    Map(ValidatedMap),
}

impl Validated {
    /// 스칼라 참조를 반환합니다.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// 문자열 스칼라이면 참조를 반환합니다.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// 숫자 스칼라이면 값을 반환합니다.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    /// 불리언 스칼라이면 값을 반환합니다.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Scalar::as_bool)
    }

    /// 템플릿 표현식 참조를 반환합니다.
    pub fn as_template(&self) -> Option<&TemplateExpr> {
        match self {
            Self::Template(t) => Some(t),
            _ => None,
        }
    }

    /// 리스트 참조를 반환합니다.
    pub fn as_list(&self) -> Option<&[Validated]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// 맵 참조를 반환합니다.
    pub fn as_map(&self) -> Option<&ValidatedMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// 검증된 맵
///
/// 스키마에 선언된 키만 포함합니다. 기본값 없는 선택 슬롯이 누락된 경우
/// 해당 키는 존재하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedMap {
    entries: BTreeMap<String, Validated>,
}

impl ValidatedMap {
    pub(crate) fn insert(&mut self, key: String, value: Validated) {
        self.entries.insert(key, value);
    }

    /// 키에 해당하는 값을 반환합니다.
    pub fn get(&self, key: &str) -> Option<&Validated> {
        self.entries.get(key)
    }

    /// 문자열 값을 반환합니다.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Validated::as_str)
    }

    /// 숫자 값을 반환합니다.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Validated::as_f64)
    }

    /// 불리언 값을 반환합니다.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Validated::as_bool)
    }

    /// 템플릿 표현식을 반환합니다.
    pub fn template(&self, key: &str) -> Option<&TemplateExpr> {
        self.get(key).and_then(Validated::as_template)
    }

    /// 리스트 값을 반환합니다.
    pub fn list(&self, key: &str) -> Option<&[Validated]> {
        self.get(key).and_then(Validated::as_list)
    }

    /// 키 존재 여부를 반환합니다.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 키 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부를 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (키, 값) 쌍을 키 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Validated)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
