//! 자체 메트릭 상수 및 설명 등록
//!
//! linestat 프로세스 자신의 동작을 관찰하기 위한 메트릭 이름을 중앙에서 정의합니다.
//! (로그에서 추출해 StatsD로 보내는 메트릭과는 별개입니다.)
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `linestat_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(linestat_core::metrics::LINES_PROCESSED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파서 이름 레이블 키
pub const LABEL_PARSER: &str = "parser";

/// 메트릭 종류 레이블 키 (counter, gauge, timer)
pub const LABEL_KIND: &str = "kind";

// ─── Line Pipeline 메트릭 ──────────────────────────────────────────

/// 처리된 전체 라인 수 (counter)
pub const LINES_PROCESSED_TOTAL: &str = "linestat_lines_processed_total";

/// 파서에 매칭된 라인 수 (counter, label: parser)
pub const LINES_MATCHED_TOTAL: &str = "linestat_lines_matched_total";

/// 파서에 매칭되지 않은 라인 수 (counter, label: parser)
pub const LINES_UNMATCHED_TOTAL: &str = "linestat_lines_unmatched_total";

/// 라인 하나의 처리 지연 시간 (histogram, 초)
pub const LINE_PROCESSING_DURATION_SECONDS: &str = "linestat_line_processing_duration_seconds";

/// 설정된 파서 수 (gauge)
pub const PARSERS_CONFIGURED: &str = "linestat_parsers_configured";

// ─── Dispatcher 메트릭 ─────────────────────────────────────────────

/// 싱크로 전달된 메트릭 수 (counter, label: kind)
pub const METRICS_EMITTED_TOTAL: &str = "linestat_metrics_emitted_total";

/// 필드 누락/숫자 변환 실패로 건너뛴 메트릭 수 (counter)
pub const METRICS_SKIPPED_TOTAL: &str = "linestat_metrics_skipped_total";

// ─── StatsD 싱크 메트릭 ────────────────────────────────────────────

/// 전송 큐가 가득 차 버려진 메트릭 수 (counter)
pub const STATSD_DROPPED_TOTAL: &str = "linestat_statsd_dropped_total";

/// UDP 전송 실패 수 (counter)
pub const STATSD_SEND_ERRORS_TOTAL: &str = "linestat_statsd_send_errors_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 라인 처리 지연 시간 히스토그램 버킷 (초)
///
/// 1us ~ 10ms 범위, 라인 단위 분포
pub const LINE_PROCESSING_DURATION_BUCKETS: [f64; 8] = [
    0.000_001, 0.000_005, 0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.01,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        LINES_PROCESSED_TOTAL,
        "Total number of log lines fed into the pipeline"
    );
    describe_counter!(
        LINES_MATCHED_TOTAL,
        "Number of lines matched, per parser"
    );
    describe_counter!(
        LINES_UNMATCHED_TOTAL,
        "Number of lines not matched, per parser"
    );
    describe_histogram!(
        LINE_PROCESSING_DURATION_SECONDS,
        "Time to parse and dispatch a single line in seconds"
    );
    describe_gauge!(PARSERS_CONFIGURED, "Number of configured parsers");
    describe_counter!(
        METRICS_EMITTED_TOTAL,
        "Number of derived metrics handed to the sink, per kind"
    );
    describe_counter!(
        METRICS_SKIPPED_TOTAL,
        "Number of metric definitions skipped because a field was absent or not numeric"
    );
    describe_counter!(
        STATSD_DROPPED_TOTAL,
        "Number of StatsD packets dropped because the send queue was full"
    );
    describe_counter!(
        STATSD_SEND_ERRORS_TOTAL,
        "Number of StatsD UDP send failures"
    );
}
