//! 스키마 노드 -- 설정 서브트리의 기대 형태를 선언합니다.
//!
//! 스키마 트리는 시작 시점에 코드로 구성되며 이후 변경되지 않습니다.

use std::fmt;

/// 스칼라 값
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// 문자열
    String(String),
    /// 숫자 (정수 포함)
    Number(f64),
    /// 불리언
    Bool(bool),
}

impl Scalar {
    /// 값의 타입을 반환합니다.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Number(_) => ValueType::Number,
            Self::Bool(_) => ValueType::Bool,
        }
    }

    /// 문자열이면 참조를 반환합니다.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// 숫자이면 값을 반환합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// 불리언이면 값을 반환합니다.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            // 정수 값은 소수점 없이 표시 ("1.0" 대신 "1")
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// 스칼라 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// 문자열
    String,
    /// 숫자
    Number,
    /// 불리언
    Bool,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// 스칼라 슬롯 공통 설정
///
/// 허용 타입 집합, 필수 여부, 기본값을 담습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSpec {
    /// 허용 타입 (하나 이상)
    pub types: Vec<ValueType>,
    /// 필수 여부
    pub required: bool,
    /// 누락 시 기본값 (선택 슬롯에만 의미가 있음)
    pub default: Option<Scalar>,
}

impl ScalarSpec {
    fn new(types: Vec<ValueType>) -> Self {
        Self {
            types,
            required: true,
            default: None,
        }
    }

    /// 허용 타입 목록을 사람이 읽을 수 있는 형태로 반환합니다.
    pub fn expected(&self) -> String {
        self.types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// 설정 슬롯 하나의 선언적 설명
///
/// # 사용 예시
/// ```
/// use linestat_core::schema::SchemaNode;
///
/// let key = SchemaNode::map()
///     .field("type", SchemaNode::string().allowed_values(["counter", "gauge", "timer"]))
///     .field("key", SchemaNode::string().pattern_capable())
///     .field("multiplier", SchemaNode::number().with_default(1.0));
/// let schema = SchemaNode::map().field("keys", SchemaNode::list(key));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// 단순 스칼라
    Scalar(ScalarSpec),
    /// 허용 값 집합이 있는 스칼라
    Enum {
        /// 스칼라 설정
        spec: ScalarSpec,
        /// 허용 값
        allowed: Vec<Scalar>,
    },
    /// 리터럴 또는 `{field}` 템플릿을 받는 스칼라
    Pattern(ScalarSpec),
    /// 리스트 (모든 요소가 같은 스키마)
    List {
        /// 요소 스키마
        element: Box<SchemaNode>,
        /// 필수 여부
        required: bool,
    },
    /// 고정 키 맵
    Map {
        /// 키 → 스키마 (선언 순서 유지)
        fields: Vec<(String, SchemaNode)>,
        /// 필수 여부
        required: bool,
    },
}

impl SchemaNode {
    /// 필수 문자열 슬롯을 생성합니다.
    pub fn string() -> Self {
        Self::Scalar(ScalarSpec::new(vec![ValueType::String]))
    }

    /// 필수 숫자 슬롯을 생성합니다.
    pub fn number() -> Self {
        Self::Scalar(ScalarSpec::new(vec![ValueType::Number]))
    }

    /// 필수 불리언 슬롯을 생성합니다.
    pub fn bool() -> Self {
        Self::Scalar(ScalarSpec::new(vec![ValueType::Bool]))
    }

    /// 여러 타입 중 하나를 허용하는 필수 슬롯을 생성합니다.
    pub fn one_of(types: impl IntoIterator<Item = ValueType>) -> Self {
        Self::Scalar(ScalarSpec::new(types.into_iter().collect()))
    }

    /// 리스트 슬롯을 생성합니다.
    pub fn list(element: SchemaNode) -> Self {
        Self::List {
            element: Box::new(element),
            required: true,
        }
    }

    /// 빈 맵 슬롯을 생성합니다. [`field`](Self::field)로 키를 추가합니다.
    pub fn map() -> Self {
        Self::Map {
            fields: Vec::new(),
            required: true,
        }
    }

    /// 맵에 키를 추가합니다. 맵이 아니면 그대로 반환합니다.
    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let Self::Map { fields, .. } = &mut self {
            fields.push((name.into(), node));
        }
        self
    }

    /// 선택 슬롯으로 만듭니다 (기본값 없음).
    pub fn optional(mut self) -> Self {
        match &mut self {
            Self::Scalar(spec) | Self::Enum { spec, .. } | Self::Pattern(spec) => {
                spec.required = false;
            }
            Self::List { required, .. } | Self::Map { required, .. } => *required = false,
        }
        self
    }

    /// 기본값을 지정하고 선택 슬롯으로 만듭니다.
    pub fn with_default(mut self, default: impl Into<Scalar>) -> Self {
        if let Some(spec) = self.spec_mut() {
            spec.required = false;
            spec.default = Some(default.into());
        }
        self
    }

    /// 허용 값 집합을 지정합니다.
    pub fn allowed_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let allowed = values.into_iter().map(Into::into).collect();
        match self {
            Self::Scalar(spec) | Self::Enum { spec, .. } => Self::Enum { spec, allowed },
            other => other,
        }
    }

    /// 템플릿 표현식을 허용합니다.
    pub fn pattern_capable(self) -> Self {
        match self {
            Self::Scalar(spec) => Self::Pattern(spec),
            other => other,
        }
    }

    /// 슬롯이 필수인지 여부를 반환합니다.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Scalar(spec) | Self::Enum { spec, .. } | Self::Pattern(spec) => spec.required,
            Self::List { required, .. } | Self::Map { required, .. } => *required,
        }
    }

    fn spec_mut(&mut self) -> Option<&mut ScalarSpec> {
        match self {
            Self::Scalar(spec) | Self::Enum { spec, .. } | Self::Pattern(spec) => Some(spec),
            Self::List { .. } | Self::Map { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let node = SchemaNode::number().with_default(8125_i64);
        match node {
            SchemaNode::Scalar(spec) => {
                assert!(!spec.required);
                assert_eq!(spec.default, Some(Scalar::Number(8125.0)));
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn allowed_values_turns_scalar_into_enum() {
        let node = SchemaNode::string().allowed_values(["a", "b"]);
        assert!(matches!(node, SchemaNode::Enum { ref allowed, .. } if allowed.len() == 2));
        assert!(node.is_required());
    }

    #[test]
    fn pattern_capable_keeps_spec() {
        let node = SchemaNode::one_of([ValueType::String, ValueType::Number]).pattern_capable();
        match node {
            SchemaNode::Pattern(spec) => assert_eq!(spec.expected(), "string or number"),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn list_and_map_can_be_optional() {
        assert!(SchemaNode::list(SchemaNode::string()).is_required());
        assert!(!SchemaNode::list(SchemaNode::string()).optional().is_required());
        assert!(!SchemaNode::map().optional().is_required());
    }

    #[test]
    fn field_on_non_map_is_ignored() {
        let node = SchemaNode::string().field("x", SchemaNode::number());
        assert_eq!(node, SchemaNode::string());
    }

    #[test]
    fn scalar_display_drops_integer_fraction() {
        assert_eq!(Scalar::Number(1.0).to_string(), "1");
        assert_eq!(Scalar::Number(1.5).to_string(), "1.5");
        assert_eq!(Scalar::from("x").to_string(), "x");
    }
}
