//! linestat 로그 파이프라인
//!
//! 로그 라인에서 필드를 추출하고(파서), 추출된 필드를 메트릭으로 변환해(프로세서)
//! StatsD로 전송합니다(싱크).
//!
//! # 모듈 구성
//!
//! - [`parser`]: 정규식/JSON/통과 라인 파서
//! - [`processor`]: StatsD 메트릭 디스패처, 빈 프로세서
//! - [`sink`]: StatsD UDP 클라이언트 및 메모리/폐기 싱크
//! - [`pipeline`]: 설정 검증, 라우트 조립, 라인 처리
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! line source -> LinePipeline -> Parser -> FieldMap -> Processor -> MetricSink -> UDP
//!                                 |                      |
//!                          regex/json/passthru      statsd/noop
//! ```

pub mod error;
pub mod parser;
pub mod pipeline;
pub mod processor;
pub mod sink;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LinePipeline, LinePipelineBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{CompiledParser, JsonParser, ParserKind, PassthruParser, RegexParser};

// 프로세서
pub use processor::{MetricDefinition, MetricKind, ProcessorKind, StatsdSetup, dispatch};

// 싱크
pub use sink::{DiscardSink, Emission, MemorySink, StatsdClient};
