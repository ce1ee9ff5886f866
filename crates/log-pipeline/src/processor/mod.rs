//! 프로세서 모듈 -- 파서가 만든 필드 맵을 소비하는 쪽
//!
//! 프로세서 종류는 닫힌 집합([`ProcessorKind`])입니다.
//! 설정 파일의 `[processors.<name>]` 섹션이 모듈 인스턴스를 만들고,
//! 각 파서의 `[parsers.<name>.processors.<name>]` 섹션이 라우트별 처리 파라미터를 줍니다.
//!
//! # 지원 종류
//! - `statsd`: 필드를 StatsD 메트릭으로 변환 ([`StatsdProcessor`])
//! - `noop`: 아무것도 하지 않음 ([`NoopProcessor`])

pub mod noop;
pub mod statsd;

pub use noop::NoopProcessor;
pub use statsd::{MetricDefinition, MetricKind, StatsdProcessor, StatsdSetup, dispatch};

use std::fmt;

use linestat_core::schema::SchemaNode;
use linestat_core::types::FieldMap;

/// 프로세서 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    /// StatsD 메트릭 전송
    Statsd,
    /// 비활성
    Noop,
}

impl ProcessorKind {
    /// 모든 프로세서 종류
    pub const ALL: [ProcessorKind; 2] = [Self::Statsd, Self::Noop];

    /// 설정 이름으로 종류를 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// 설정에서 사용하는 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Statsd => "statsd",
            Self::Noop => "noop",
        }
    }

    /// `--list-modules`에 표시되는 설명
    pub fn description(self) -> &'static str {
        match self {
            Self::Statsd => "sends counters, gauges and timers derived from fields to a StatsD server",
            Self::Noop => "does nothing; route a parser here to disable its metrics temporarily",
        }
    }

    /// 모듈 설정 스키마. `None`이면 검증하지 않습니다.
    pub fn setup_schema(self) -> Option<SchemaNode> {
        match self {
            Self::Statsd => Some(statsd::setup_schema()),
            Self::Noop => None,
        }
    }

    /// 라우트별 처리 파라미터 스키마. `None`이면 검증하지 않습니다.
    pub fn params_schema(self) -> Option<SchemaNode> {
        match self {
            Self::Statsd => Some(statsd::params_schema()),
            Self::Noop => None,
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 라우트 하나에 연결된 프로세서
#[derive(Debug, Clone)]
pub enum Processor {
    /// StatsD
    Statsd(StatsdProcessor),
    /// 비활성
    Noop(NoopProcessor),
}

impl Processor {
    /// 프로세서 종류
    pub fn kind(&self) -> ProcessorKind {
        match self {
            Self::Statsd(_) => ProcessorKind::Statsd,
            Self::Noop(_) => ProcessorKind::Noop,
        }
    }

    /// 필드 맵 하나를 처리하고 전달된 메트릭 수를 반환합니다.
    pub fn process(&self, fields: &FieldMap<'_>) -> usize {
        match self {
            Self::Statsd(p) => p.process(fields),
            Self::Noop(p) => p.process(fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ProcessorKind::ALL {
            assert_eq!(ProcessorKind::from_name(kind.name()), Some(kind));
            assert!(!kind.description().is_empty());
        }
        assert_eq!(ProcessorKind::from_name("graphite"), None);
    }

    #[test]
    fn noop_has_no_schemas() {
        assert!(ProcessorKind::Noop.setup_schema().is_none());
        assert!(ProcessorKind::Noop.params_schema().is_none());
        assert!(ProcessorKind::Statsd.setup_schema().is_some());
        assert!(ProcessorKind::Statsd.params_schema().is_some());
    }

    #[test]
    fn noop_processor_reports_kind() {
        let processor = Processor::Noop(NoopProcessor);
        assert_eq!(processor.kind(), ProcessorKind::Noop);
        assert_eq!(processor.process(&FieldMap::new()), 0);
    }
}
