//! StatsD 프로세서 -- 필드 맵을 카운터/게이지/타이머 메트릭으로 변환합니다.
//!
//! # 설정
//! 모듈 설정(`[processors.<name>]`):
//! ```toml
//! kind = "statsd"
//! prefix = "web"
//! host = "127.0.0.1"
//! port = 8125          # 기본값
//! ```
//!
//! 파서별 처리 파라미터(`[parsers.<name>.processors.<name>]`):
//! ```toml
//! [[parsers.access.processors.statsd.keys]]
//! type = "counter"          # counter | gauge | timer
//! key = "status.{status}"   # 리터럴 또는 템플릿
//! value = 1                 # 숫자, 숫자 문자열, 바이트 크기("2k") 또는 템플릿
//! multiplier = 1            # 기본값
//! ```
//!
//! # 디스패치 규칙
//! 정의는 선언 순서대로 처리됩니다. key 또는 value가 Absent로 해석되면
//! 해당 정의만 건너뛰며 에러는 발생하지 않습니다. 최종 값은
//! `round(value * multiplier)`입니다.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use linestat_core::error::SchemaError;
use linestat_core::metrics as m;
use linestat_core::pipeline::MetricSink;
use linestat_core::schema::{SchemaNode, ValidatedMap};
use linestat_core::template::TemplateExpr;
use linestat_core::types::FieldMap;

/// StatsD 기본 포트
pub const DEFAULT_PORT: u16 = 8125;

/// 메트릭 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// 증가량 (`|c`)
    Counter,
    /// 현재 값 (`|g`)
    Gauge,
    /// 소요 시간, 밀리초 (`|ms`)
    Timer,
}

impl MetricKind {
    /// 모든 메트릭 종류
    pub const ALL: [MetricKind; 3] = [Self::Counter, Self::Gauge, Self::Timer];

    /// 설정 이름으로 종류를 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// 설정에서 사용하는 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Timer => "timer",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 메트릭 정의 하나 (`keys` 리스트의 원소)
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    /// 메트릭 종류
    pub kind: MetricKind,
    /// 메트릭 이름 (접두어 제외)
    pub key: TemplateExpr,
    /// 값 (숫자 또는 바이트 크기)
    pub value: TemplateExpr,
    /// 값에 곱할 배수
    pub multiplier: f64,
}

impl MetricDefinition {
    /// 검증된 `keys` 원소로부터 정의를 생성합니다.
    ///
    /// `entry`는 [`key_schema`]로 검증된 맵이어야 하며, `path`는 에러 보고용입니다.
    pub fn from_validated(entry: &ValidatedMap, path: &str) -> Result<Self, SchemaError> {
        let kind = entry
            .str("type")
            .and_then(MetricKind::from_name)
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: format!("{path}.type"),
            })?;
        let key = entry
            .template("key")
            .cloned()
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: format!("{path}.key"),
            })?;
        let value = entry
            .template("value")
            .cloned()
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: format!("{path}.value"),
            })?;
        let multiplier = entry.number("multiplier").unwrap_or(1.0);

        Ok(Self {
            kind,
            key,
            value,
            multiplier,
        })
    }

    /// 참조하는 필드를 `(슬롯 이름, 필드명)` 쌍으로 순회합니다.
    pub fn field_references(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.key
            .field_names()
            .map(|f| ("key", f))
            .chain(self.value.field_names().map(|f| ("value", f)))
    }

    /// 필드 맵으로 (이름, 최종 값)을 해석합니다.
    ///
    /// key/value 중 하나라도 Absent이거나 값이 유한한 숫자가 아니면 `None`입니다.
    pub fn resolve<'s>(&'s self, fields: &'s FieldMap<'_>) -> Option<(Cow<'s, str>, i64)> {
        let key = self.key.resolve_str(fields)?;
        let value = self.value.resolve_number(fields)?;
        let scaled = (value * self.multiplier).round();
        if !scaled.is_finite() {
            return None;
        }
        Some((key, scaled as i64))
    }
}

/// `keys` 원소 스키마
pub fn key_schema() -> SchemaNode {
    SchemaNode::map()
        .field(
            "type",
            SchemaNode::string().allowed_values(MetricKind::ALL.map(MetricKind::name)),
        )
        .field("key", SchemaNode::string().pattern_capable())
        .field("value", SchemaNode::number().pattern_capable())
        .field("multiplier", SchemaNode::number().with_default(1.0))
}

/// 모듈 설정 스키마 (`kind` 제외)
pub fn setup_schema() -> SchemaNode {
    SchemaNode::map()
        .field("prefix", SchemaNode::string())
        .field("host", SchemaNode::string())
        .field(
            "port",
            SchemaNode::number().with_default(f64::from(DEFAULT_PORT)),
        )
}

/// 파서별 처리 파라미터 스키마
pub fn params_schema() -> SchemaNode {
    SchemaNode::map().field("keys", SchemaNode::list(key_schema()))
}

/// StatsD 모듈 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsdSetup {
    /// 모든 메트릭 이름 앞에 붙는 접두어
    pub prefix: String,
    /// 수집기 호스트
    pub host: String,
    /// 수집기 포트
    pub port: u16,
}

impl StatsdSetup {
    /// 검증된 모듈 설정으로부터 생성합니다.
    pub fn from_validated(setup: &ValidatedMap, path: &str) -> Result<Self, SchemaError> {
        let prefix = setup.str("prefix").unwrap_or_default().to_owned();
        let host = setup.str("host").unwrap_or_default().to_owned();
        let raw_port = setup.number("port").unwrap_or(f64::from(DEFAULT_PORT));

        if raw_port.fract() != 0.0 || !(1.0..=f64::from(u16::MAX)).contains(&raw_port) {
            return Err(SchemaError::TypeMismatch {
                path: format!("{path}.port"),
                expected: "port number (1-65535)".to_owned(),
                found: raw_port.to_string(),
            });
        }

        Ok(Self {
            prefix,
            host,
            port: raw_port as u16,
        })
    }
}

/// 검증된 처리 파라미터로부터 메트릭 정의 목록을 생성합니다.
pub fn definitions(
    params: &ValidatedMap,
    path: &str,
) -> Result<Vec<MetricDefinition>, SchemaError> {
    params
        .list("keys")
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let entry_path = format!("{path}.keys[{idx}]");
            let map = entry.as_map().ok_or_else(|| SchemaError::TypeMismatch {
                path: entry_path.clone(),
                expected: "map".to_owned(),
                found: "scalar".to_owned(),
            })?;
            MetricDefinition::from_validated(map, &entry_path)
        })
        .collect()
}

/// 메트릭 정의를 필드 맵에 적용하여 싱크로 전달합니다.
///
/// 정의는 선언 순서대로 처리되며, 전달된 메트릭 수를 반환합니다.
pub fn dispatch(
    definitions: &[MetricDefinition],
    fields: &FieldMap<'_>,
    sink: &dyn MetricSink,
) -> usize {
    let mut emitted = 0;

    for definition in definitions {
        let Some((key, value)) = definition.resolve(fields) else {
            metrics::counter!(m::METRICS_SKIPPED_TOTAL).increment(1);
            tracing::trace!(
                kind = %definition.kind,
                fields = %fields,
                "metric skipped, field absent or not numeric"
            );
            continue;
        };

        tracing::debug!(kind = %definition.kind, key = %key, value, "statsd emit");
        match definition.kind {
            MetricKind::Counter => sink.increment(&key, value),
            MetricKind::Gauge => sink.gauge(&key, value),
            MetricKind::Timer => sink.timing(&key, value),
        }
        metrics::counter!(m::METRICS_EMITTED_TOTAL, m::LABEL_KIND => definition.kind.name())
            .increment(1);
        emitted += 1;
    }

    emitted
}

/// 설정된 StatsD 라우트 -- 싱크와 메트릭 정의 목록
#[derive(Clone)]
pub struct StatsdProcessor {
    sink: Arc<dyn MetricSink>,
    definitions: Vec<MetricDefinition>,
}

impl StatsdProcessor {
    /// 새 프로세서를 생성합니다.
    pub fn new(sink: Arc<dyn MetricSink>, definitions: Vec<MetricDefinition>) -> Self {
        Self { sink, definitions }
    }

    /// 메트릭 정의 목록
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// 필드 맵 하나를 처리합니다.
    pub fn process(&self, fields: &FieldMap<'_>) -> usize {
        dispatch(&self.definitions, fields, self.sink.as_ref())
    }
}

impl fmt::Debug for StatsdProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsdProcessor")
            .field("definitions", &self.definitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Emission, MemorySink};
    use linestat_core::schema::Validator;
    use serde_json::json;

    fn defs(raw: serde_json::Value) -> Vec<MetricDefinition> {
        let validated = Validator::new().validate(&params_schema(), &raw).unwrap();
        definitions(validated.as_map().unwrap(), "p").unwrap()
    }

    fn fields<'a>(pairs: &[(&'a str, &'a str)]) -> FieldMap<'a> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn metric_kind_names() {
        for kind in MetricKind::ALL {
            assert_eq!(MetricKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MetricKind::from_name("histogram"), None);
    }

    #[test]
    fn counter_with_templated_key() {
        let defs = defs(json!({"keys": [
            {"type": "counter", "key": "status.{status}", "value": 1}
        ]}));
        let sink = MemorySink::default();
        let n = dispatch(&defs, &fields(&[("status", "200"), ("bytes", "1024")]), &sink);
        assert_eq!(n, 1);
        assert_eq!(sink.emissions(), [Emission::increment("status.200", 1)]);
    }

    #[test]
    fn gauge_with_templated_value() {
        let defs = defs(json!({"keys": [
            {"type": "gauge", "key": "bytes", "value": "{bytes}"}
        ]}));
        let sink = MemorySink::default();
        dispatch(&defs, &fields(&[("status", "200"), ("bytes", "1024")]), &sink);
        assert_eq!(sink.emissions(), [Emission::gauge("bytes", 1024)]);
    }

    #[test]
    fn timer_applies_multiplier_and_rounds() {
        // 초 단위 → 밀리초
        let defs = defs(json!({"keys": [
            {"type": "timer", "key": "latency", "value": "{secs}", "multiplier": 1000}
        ]}));
        let sink = MemorySink::default();
        dispatch(&defs, &fields(&[("secs", "0.0126")]), &sink);
        assert_eq!(sink.emissions(), [Emission::timing("latency", 13)]);
    }

    #[test]
    fn byte_size_values_are_coerced() {
        let defs = defs(json!({"keys": [{"type": "gauge", "key": "size", "value": "{size}"}]}));
        let sink = MemorySink::default();
        dispatch(&defs, &fields(&[("size", "2k")]), &sink);
        assert_eq!(sink.emissions(), [Emission::gauge("size", 2048)]);
    }

    #[test]
    fn absent_field_skips_only_that_definition() {
        let defs = defs(json!({"keys": [
            {"type": "counter", "key": "status.{status}", "value": 1},
            {"type": "gauge", "key": "bytes", "value": "{bytes}"},
            {"type": "counter", "key": "hits", "value": 1}
        ]}));
        let sink = MemorySink::default();
        let n = dispatch(&defs, &fields(&[("status", "404")]), &sink);
        assert_eq!(n, 2);
        assert_eq!(
            sink.emissions(),
            [Emission::increment("status.404", 1), Emission::increment("hits", 1)]
        );
    }

    #[test]
    fn unparseable_value_is_skipped() {
        let defs = defs(json!({"keys": [{"type": "gauge", "key": "x", "value": "{v}"}]}));
        let sink = MemorySink::default();
        assert_eq!(dispatch(&defs, &fields(&[("v", "bogus")]), &sink), 0);
        assert!(sink.emissions().is_empty());
    }

    #[test]
    fn definitions_emit_in_declaration_order() {
        let defs = defs(json!({"keys": [
            {"type": "gauge", "key": "b", "value": 2},
            {"type": "counter", "key": "a", "value": 1},
            {"type": "timer", "key": "c", "value": "3"}
        ]}));
        let sink = MemorySink::default();
        dispatch(&defs, &FieldMap::new(), &sink);
        assert_eq!(
            sink.emissions(),
            [
                Emission::gauge("b", 2),
                Emission::increment("a", 1),
                Emission::timing("c", 3)
            ]
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let defs = defs(json!({"keys": [{"type": "gauge", "key": "k.{a}", "value": "{b}"}]}));
        let f = fields(&[("a", "x"), ("b", "1.5")]);
        let first = defs[0].resolve(&f);
        let second = defs[0].resolve(&f);
        assert_eq!(first, second);
        assert_eq!(first, Some((Cow::Borrowed("k.x"), 2)));
    }

    #[test]
    fn field_references_name_their_slot() {
        let defs = defs(json!({"keys": [{"type": "gauge", "key": "k.{a}", "value": "{b}"}]}));
        let refs: Vec<_> = defs[0].field_references().collect();
        assert_eq!(refs, [("key", "a"), ("value", "b")]);
    }

    #[test]
    fn invalid_type_reports_path() {
        let raw = json!({"keys": [
            {"type": "counter", "key": "a", "value": 1},
            {"type": "meter", "key": "b", "value": 1}
        ]});
        let err = Validator::new()
            .validate_at(&params_schema(), &raw, "parsers.access.processors.statsd")
            .unwrap_err();
        assert_eq!(err.path(), "parsers.access.processors.statsd.keys[1].type");
    }

    #[test]
    fn setup_defaults_port() {
        let validated = Validator::new()
            .validate(&setup_schema(), &json!({"prefix": "web", "host": "localhost"}))
            .unwrap();
        let setup = StatsdSetup::from_validated(validated.as_map().unwrap(), "processors.statsd")
            .unwrap();
        assert_eq!(setup.port, DEFAULT_PORT);
        assert_eq!(setup.prefix, "web");
    }

    #[test]
    fn setup_requires_prefix_and_host() {
        let err = Validator::new()
            .validate_at(&setup_schema(), &json!({"host": "localhost"}), "processors.statsd")
            .unwrap_err();
        assert_eq!(err.path(), "processors.statsd.prefix");
    }

    #[test]
    fn setup_rejects_out_of_range_port() {
        let validated = Validator::new()
            .validate(
                &setup_schema(),
                &json!({"prefix": "p", "host": "h", "port": 70000}),
            )
            .unwrap();
        let err = StatsdSetup::from_validated(validated.as_map().unwrap(), "processors.statsd")
            .unwrap_err();
        assert_eq!(err.path(), "processors.statsd.port");
    }

    #[test]
    fn processor_uses_its_sink() {
        let sink = Arc::new(MemorySink::default());
        let processor = StatsdProcessor::new(
            sink.clone(),
            defs(json!({"keys": [{"type": "counter", "key": "hits", "value": 1}]})),
        );
        assert_eq!(processor.definitions().len(), 1);
        assert_eq!(processor.process(&FieldMap::new()), 1);
        assert_eq!(sink.emissions(), [Emission::increment("hits", 1)]);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn emitted_value_is_rounded_product(v in -1.0e9f64..1.0e9, mult in -1000.0f64..1000.0) {
                let definition = MetricDefinition {
                    kind: MetricKind::Gauge,
                    key: TemplateExpr::Literal("k".into()),
                    value: TemplateExpr::Literal(v.into()),
                    multiplier: mult,
                };
                let (_, value) = definition.resolve(&FieldMap::new()).unwrap();
                prop_assert_eq!(value, (v * mult).round() as i64);
            }
        }
    }
}
