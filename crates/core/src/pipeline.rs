//! 파이프라인 trait -- 파서와 메트릭 싱크의 확장 포인트

use crate::types::ParseOutcome;

/// 라인 파서 trait
///
/// 컴파일된 파서는 불변이며 호출 간 상태를 공유하지 않으므로,
/// 여러 스레드에서 서로 다른 라인에 대해 동시에 호출할 수 있습니다.
pub trait LineParser: Send + Sync {
    /// 파서 종류 이름 (예: `"regex"`)
    fn kind(&self) -> &'static str;

    /// 라인 하나를 파싱합니다. 어떤 입력에도 패닉하지 않아야 합니다.
    fn parse<'a>(&'a self, line: &'a str) -> ParseOutcome<'a>;

    /// 이 파서가 `field` 이름의 필드를 만들어낼 수 있는지 여부
    ///
    /// 출력 필드 집합이 고정되지 않은 파서는 항상 `true`를 반환합니다.
    fn provides(&self, field: &str) -> bool;
}

/// 메트릭 싱크 trait
///
/// 호출자는 전송 결과를 관찰하지 않습니다 (fire-and-forget).
/// 접두어(prefix)는 싱크가 붙입니다.
pub trait MetricSink: Send + Sync {
    /// 카운터를 `amount`만큼 증가시킵니다.
    fn increment(&self, key: &str, amount: i64);

    /// 게이지를 `value`로 설정합니다.
    fn gauge(&self, key: &str, value: i64);

    /// 타이머 값을 기록합니다 (밀리초).
    fn timing(&self, key: &str, duration_ms: i64);
}

impl<S: MetricSink + ?Sized> MetricSink for std::sync::Arc<S> {
    fn increment(&self, key: &str, amount: i64) {
        (**self).increment(key, amount);
    }

    fn gauge(&self, key: &str, value: i64) {
        (**self).gauge(key, value);
    }

    fn timing(&self, key: &str, duration_ms: i64) {
        (**self).timing(key, duration_ms);
    }
}
