//! 에러 타입 -- 도메인별 에러 정의
//!
//! 설정/스키마 에러는 모두 시작 시점에만 발생하며 치명적입니다.
//! 라인 처리 중의 실패(필드 없음, 숫자 변환 실패, 매칭 실패)는 에러가 아니라
//! 해당 메트릭만 건너뛰는 soft failure로 처리되므로 여기에 정의하지 않습니다.

/// linestat 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LinestatError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스키마 검증 에러
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// 파이프라인 구성 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 파일 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스키마 검증 에러
///
/// 모든 variant는 설정 트리 내 위치(`path`)를 포함합니다.
/// 예: `parsers.access.processors.statsd.keys[1].type`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// 필수 필드 누락
    #[error("{path}: missing required field")]
    MissingRequiredField { path: String },

    /// 타입 불일치
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// 허용되지 않은 값
    #[error("{path}: invalid value '{value}', allowed values: {allowed}")]
    InvalidEnumValue {
        path: String,
        value: String,
        allowed: String,
    },

    /// 잘못된 템플릿 표현식
    #[error("{path}: malformed template '{template}': {reason}")]
    MalformedTemplate {
        path: String,
        template: String,
        reason: String,
    },

    /// 알 수 없는 키 (strict 모드)
    #[error("{path}: unknown key")]
    UnknownKey { path: String },
}

impl SchemaError {
    /// 에러가 발생한 설정 경로를 반환합니다.
    pub fn path(&self) -> &str {
        match self {
            Self::MissingRequiredField { path }
            | Self::TypeMismatch { path, .. }
            | Self::InvalidEnumValue { path, .. }
            | Self::MalformedTemplate { path, .. }
            | Self::UnknownKey { path } => path,
        }
    }
}

/// 파이프라인 구성 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 메트릭 싱크 초기화 실패
    #[error("sink init failed: {0}")]
    SinkInit(String),
}
