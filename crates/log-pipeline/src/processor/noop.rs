//! 빈 프로세서 -- 아무것도 하지 않습니다.
//!
//! 파서 설정을 지우지 않고 메트릭 전송만 잠시 끄고 싶을 때 라우트 대상으로 사용합니다.
//! 모듈 설정과 처리 파라미터는 strict 모드에서도 검증 없이 무시됩니다.

use linestat_core::types::FieldMap;

/// 빈 프로세서
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcessor;

impl NoopProcessor {
    /// 필드 맵을 버립니다. 항상 0을 반환합니다.
    pub fn process(&self, fields: &FieldMap<'_>) -> usize {
        tracing::trace!(fields = fields.len(), "noop processor");
        0
    }
}
