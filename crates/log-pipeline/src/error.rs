//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 파이프라인 구성(시작 시점) 중 발생하는 모든 에러를 표현합니다.
//! 라인 처리 중에는 에러가 발생하지 않습니다.
//! `From<LogPipelineError> for LinestatError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use linestat_core::error::{LinestatError, PipelineError, SchemaError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 정규식 컴파일 실패
    #[error("invalid pattern in parser '{parser}': {reason}")]
    InvalidPattern {
        /// 파서 이름
        parser: String,
        /// 실패 사유
        reason: String,
    },

    /// 파서가 만들 수 없는 필드를 참조
    #[error("parser '{parser}' does not provide field '{field}' (referenced at {path})")]
    UnknownFieldReference {
        /// 파서 이름
        parser: String,
        /// 참조된 필드명
        field: String,
        /// 참조 위치 (설정 경로)
        path: String,
    },

    /// 알 수 없는 모듈 종류
    #[error("{path}: unknown module kind '{kind}', expected one of: {expected}")]
    UnknownModule {
        /// 설정 경로
        path: String,
        /// 지정된 종류
        kind: String,
        /// 허용 종류
        expected: String,
    },

    /// 설정되지 않은 프로세서를 참조
    #[error("parser '{parser}' routes to unknown processor '{processor}'")]
    UnknownProcessor {
        /// 파서 이름
        parser: String,
        /// 프로세서 이름
        processor: String,
    },

    /// 스키마 검증 실패
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// 메트릭 싱크 에러
    #[error("sink error: {0}")]
    Sink(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LogPipelineError> for LinestatError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Schema(e) => LinestatError::Schema(e),
            LogPipelineError::Io(e) => LinestatError::Io(e),
            LogPipelineError::Sink(reason) => {
                LinestatError::Pipeline(PipelineError::SinkInit(reason))
            }
            other => LinestatError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
