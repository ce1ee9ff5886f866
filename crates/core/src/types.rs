//! 도메인 타입 -- 라인 단위로 생성되는 필드 맵과 파싱 결과
//!
//! [`FieldMap`]은 한 라인을 처리하는 동안에만 존재하며, 라인 간에 공유되지 않습니다.
//! 필드 이름은 컴파일된 패턴에서, 값은 원본 라인에서 빌려오므로
//! 매칭된 필드 수에 비례하는 할당만 발생합니다.

use std::borrow::Cow;
use std::fmt;

/// 필드 이름 → 추출 값 매핑
///
/// 라인 하나에 대해 생성되고 생성 후에는 변경되지 않습니다.
/// 필드 수가 적으므로 선형 탐색을 사용합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap<'a> {
    entries: Vec<(Cow<'a, str>, Cow<'a, str>)>,
}

impl<'a> FieldMap<'a> {
    /// 빈 필드 맵을 생성합니다.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 지정한 용량으로 필드 맵을 생성합니다.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// 필드를 추가합니다. 이미 있는 이름이면 값을 덮어씁니다.
    pub fn insert(&mut self, name: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, str>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// 필드 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_ref())
    }

    /// 필드 존재 여부를 반환합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 필드 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부를 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (이름, 값) 쌍을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }
}

impl<'a, K, V> FromIterator<(K, V)> for FieldMap<'a>
where
    K: Into<Cow<'a, str>>,
    V: Into<Cow<'a, str>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl fmt::Display for FieldMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v:?}")?;
        }
        write!(f, "}}")
    }
}

/// 라인 파싱 결과
///
/// 부분 매칭은 없습니다. 매칭되었지만 캡처되지 않은 그룹은
/// 필드 맵에서 빠질 뿐 에러가 아닙니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<'a> {
    /// 매칭 성공
    Matched(FieldMap<'a>),
    /// 매칭 실패
    NoMatch,
}

impl<'a> ParseOutcome<'a> {
    /// 매칭 성공 여부를 반환합니다.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// 필드 맵을 꺼냅니다. 매칭 실패 시 `None`.
    pub fn into_fields(self) -> Option<FieldMap<'a>> {
        match self {
            Self::Matched(fields) => Some(fields),
            Self::NoMatch => None,
        }
    }
}
