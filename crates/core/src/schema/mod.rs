//! 설정 스키마 -- 선언적 스키마 트리와 검증기
//!
//! 각 모듈(파서, 프로세서)은 자신의 설정 형태를 [`SchemaNode`] 트리로 선언하고,
//! [`Validator`]가 원시 설정(`serde_json::Value`)을 검증하여 [`Validated`] 트리를 만듭니다.
//!
//! # 노드 종류
//! - [`SchemaNode::Scalar`]: 타입/필수 여부/기본값
//! - [`SchemaNode::Enum`]: 허용 값 집합
//! - [`SchemaNode::Pattern`]: 리터럴 또는 `{field}` 템플릿
//! - [`SchemaNode::List`]: 동일 스키마 요소의 리스트
//! - [`SchemaNode::Map`]: 고정 키 맵
//!
//! # 사용 예시
//! ```
//! use linestat_core::schema::{SchemaNode, Validator};
//! use serde_json::json;
//!
//! let schema = SchemaNode::map()
//!     .field("prefix", SchemaNode::string())
//!     .field("port", SchemaNode::number().with_default(8125.0));
//!
//! let validated = Validator::new()
//!     .validate_at(&schema, &json!({"prefix": "web"}), "processors.statsd")
//!     .unwrap();
//! assert_eq!(validated.as_map().unwrap().number("port"), Some(8125.0));
//! ```

mod node;
mod validate;
mod value;

pub use node::{Scalar, ScalarSpec, SchemaNode, ValueType};
pub use validate::{Validator, validate};
pub use value::{Validated, ValidatedMap};
