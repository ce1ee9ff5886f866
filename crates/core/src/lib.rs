//! linestat 공통 크레이트
//!
//! 로그 라인에서 필드를 추출해 메트릭으로 변환하는 파이프라인의 공통 기반입니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: 설정 파일 로딩 (TOML/JSON) 및 환경변수 오버라이드
//! - [`schema`]: 선언적 설정 스키마와 검증기
//! - [`template`]: `{field}` 템플릿 파싱/해석 및 숫자(바이트 크기) 변환
//! - [`types`]: 라인별 [`FieldMap`]과 [`ParseOutcome`]
//! - [`pipeline`]: 파서/싱크 trait
//! - [`metrics`]: 자체 메트릭 이름
//! - [`error`]: 에러 타입

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod template;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LinestatError, PipelineError, SchemaError};

// 설정
pub use config::LinestatConfig;

// 스키마
pub use schema::{Scalar, SchemaNode, Validated, ValidatedMap, Validator};

// 템플릿
pub use template::{Template, TemplateExpr};

// 파이프라인 trait
pub use pipeline::{LineParser, MetricSink};

// 도메인 타입
pub use types::{FieldMap, ParseOutcome};
