//! 라인 파이프라인 -- 파서와 프로세서 라우트를 조립하고 라인을 처리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! line -> [parser "a"] --match--> FieldMap -> route "statsd" -> dispatch -> MetricSink
//!      -> [parser "b"] --match--> FieldMap -> route "noop"
//! ```
//!
//! 파이프라인은 빌드 후 불변이며, 모든 설정 에러는 [`LinePipelineBuilder::build`]에서
//! 경로와 함께 보고됩니다. 라인 처리 중에는 에러가 발생하지 않습니다.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::Value;
use tokio::task::JoinHandle;

use linestat_core::config::LinestatConfig;
use linestat_core::error::SchemaError;
use linestat_core::metrics as m;
use linestat_core::pipeline::{LineParser, MetricSink};
use linestat_core::schema::{SchemaNode, Validated, ValidatedMap, Validator};
use linestat_core::types::ParseOutcome;

use crate::error::LogPipelineError;
use crate::parser::{CompiledParser, ParserKind, RESERVED_KEYS};
use crate::processor::statsd;
use crate::processor::{NoopProcessor, Processor, ProcessorKind, StatsdProcessor, StatsdSetup};
use crate::sink::{DEFAULT_QUEUE_CAPACITY, DiscardSink, StatsdClient};

/// 파서 하나와 그 라우트
struct ParserEntry {
    name: String,
    parser: CompiledParser,
    routes: Vec<Route>,
    matched: metrics::Counter,
    unmatched: metrics::Counter,
}

/// 파서에서 프로세서로 가는 라우트
struct Route {
    processor: String,
    action: Processor,
}

/// 라인 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use linestat_log_pipeline::LinePipeline;
///
/// let config = LinestatConfig::load("linestat.toml").await?;
/// let pipeline = LinePipeline::builder(&config).build().await?;
///
/// for line in lines {
///     pipeline.process_line(&line);
/// }
/// pipeline.shutdown().await;
/// ```
pub struct LinePipeline {
    parsers: Vec<ParserEntry>,
    lines_processed: AtomicU64,
    lines_matched: AtomicU64,
    /// StatsD 전송 태스크
    tasks: Vec<JoinHandle<()>>,
}

impl LinePipeline {
    /// 설정으로부터 빌더를 생성합니다.
    pub fn builder(config: &LinestatConfig) -> LinePipelineBuilder<'_> {
        LinePipelineBuilder::new(config)
    }

    /// 라인 하나를 처리합니다.
    ///
    /// 모든 파서를 이름 순으로 적용하고, 매칭된 파서의 라우트마다 프로세서를 실행합니다.
    /// 매칭된 파서 수를 반환합니다.
    pub fn process_line(&self, line: &str) -> usize {
        let start = Instant::now();
        let mut matched = 0;

        for entry in &self.parsers {
            match entry.parser.parse(line) {
                ParseOutcome::Matched(fields) => {
                    matched += 1;
                    entry.matched.increment(1);
                    for route in &entry.routes {
                        let emitted = route.action.process(&fields);
                        tracing::trace!(
                            parser = %entry.name,
                            processor = %route.processor,
                            emitted,
                            "route processed"
                        );
                    }
                }
                ParseOutcome::NoMatch => {
                    entry.unmatched.increment(1);
                }
            }
        }

        self.lines_processed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::LINES_PROCESSED_TOTAL).increment(1);
        if matched > 0 {
            self.lines_matched.fetch_add(1, Ordering::Relaxed);
        } else {
            tracing::trace!(line, "line matched no parser");
        }
        metrics::histogram!(m::LINE_PROCESSING_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        matched
    }

    /// 처리한 라인 수
    pub fn lines_processed(&self) -> u64 {
        self.lines_processed.load(Ordering::Relaxed)
    }

    /// 하나 이상의 파서에 매칭된 라인 수
    pub fn lines_matched(&self) -> u64 {
        self.lines_matched.load(Ordering::Relaxed)
    }

    /// 설정된 파서 수
    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    /// 파서 이름 목록 (처리 순서)
    pub fn parser_names(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|p| p.name.as_str())
    }

    /// 파서의 라우트 대상 프로세서 이름 목록
    pub fn routes(&self, parser: &str) -> Option<Vec<&str>> {
        self.parsers
            .iter()
            .find(|p| p.name == parser)
            .map(|p| p.routes.iter().map(|r| r.processor.as_str()).collect())
    }

    /// 파이프라인을 닫고 대기 중인 StatsD 패킷이 전송될 때까지 기다립니다.
    pub async fn shutdown(self) {
        let Self {
            parsers,
            lines_processed,
            lines_matched,
            tasks,
        } = self;
        // 싱크(송신측)를 먼저 drop해야 전송 태스크가 큐를 비우고 종료됨
        drop(parsers);

        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "statsd send task failed");
            }
        }

        tracing::info!(
            lines_processed = lines_processed.into_inner(),
            lines_matched = lines_matched.into_inner(),
            "line pipeline stopped"
        );
    }
}

/// 파이프라인 빌더
///
/// 모든 설정 검증은 여기서 한 번에 수행됩니다.
pub struct LinePipelineBuilder<'c> {
    config: &'c LinestatConfig,
    sinks: BTreeMap<String, Arc<dyn MetricSink>>,
    dry_run: bool,
    queue_capacity: usize,
}

impl<'c> LinePipelineBuilder<'c> {
    /// 새 빌더를 생성합니다.
    pub fn new(config: &'c LinestatConfig) -> Self {
        Self {
            config,
            sinks: BTreeMap::new(),
            dry_run: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// 프로세서의 싱크를 직접 지정합니다 (StatsD 연결 대신 사용).
    pub fn sink(mut self, processor: impl Into<String>, sink: Arc<dyn MetricSink>) -> Self {
        self.sinks.insert(processor.into(), sink);
        self
    }

    /// 검증 전용 모드. 네트워크에 연결하지 않고 모든 메트릭을 버립니다.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// StatsD 전송 큐 용량을 설정합니다.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// 설정을 검증하고 파이프라인을 생성합니다.
    ///
    /// # Errors
    /// 스키마 위반, 잘못된 정규식, 알 수 없는 모듈/프로세서, 파서가 만들 수 없는
    /// 필드 참조, StatsD 주소 해석 실패 시 에러를 반환합니다.
    pub async fn build(mut self) -> Result<LinePipeline, LogPipelineError> {
        let config = self.config;
        let validator = Validator::new().strict(config.general.strict);
        let empty = ValidatedMap::default();
        let mut tasks = Vec::new();

        // 1. 프로세서 인스턴스
        let mut instances: BTreeMap<&str, Instance> = BTreeMap::new();
        for (name, raw) in &config.processors {
            let path = format!("processors.{name}");
            let kind = module_kind(raw, &path, ProcessorKind::from_name, || {
                names(ProcessorKind::ALL.map(ProcessorKind::name))
            })?;
            let setup = match kind.setup_schema() {
                Some(schema) => {
                    Some(validate_module(&validator, &schema, raw, &path, &["kind"])?)
                }
                None => None,
            };

            let instance = match kind {
                ProcessorKind::Statsd => {
                    let map = setup.as_ref().and_then(Validated::as_map);
                    let setup = StatsdSetup::from_validated(map.unwrap_or(&empty), &path)?;
                    let sink: Arc<dyn MetricSink> = match self.sinks.remove(name.as_str()) {
                        Some(sink) => sink,
                        None if self.dry_run => Arc::new(DiscardSink),
                        None => {
                            let (client, task) =
                                StatsdClient::connect(&setup, self.queue_capacity).await?;
                            tasks.push(task);
                            Arc::new(client)
                        }
                    };
                    Instance::Statsd(sink)
                }
                ProcessorKind::Noop => Instance::Noop,
            };
            tracing::debug!(processor = %name, kind = %kind, "processor configured");
            instances.insert(name.as_str(), instance);
        }

        // 2. 파서와 라우트 (BTreeMap이므로 이름 순)
        let mut parsers = Vec::with_capacity(config.parsers.len());
        for (name, raw) in &config.parsers {
            let path = format!("parsers.{name}");
            let kind = module_kind(raw, &path, ParserKind::from_name, || {
                names(ParserKind::ALL.map(ParserKind::name))
            })?;
            let params = validate_module(&validator, &kind.schema(), raw, &path, &RESERVED_KEYS)?;
            let parser = kind.compile(name, params.as_map().unwrap_or(&empty))?;
            let routes = build_routes(
                &validator,
                config.general.strict,
                name,
                &parser,
                raw,
                &instances,
            )?;

            if routes.is_empty() {
                tracing::warn!(parser = %name, "parser has no processors, matches are discarded");
            }

            parsers.push(ParserEntry {
                name: name.clone(),
                parser,
                routes,
                matched: metrics::counter!(
                    m::LINES_MATCHED_TOTAL,
                    m::LABEL_PARSER => name.clone()
                ),
                unmatched: metrics::counter!(
                    m::LINES_UNMATCHED_TOTAL,
                    m::LABEL_PARSER => name.clone()
                ),
            });
        }

        for name in self.sinks.keys() {
            tracing::warn!(processor = %name, "sink override for unknown processor ignored");
        }

        metrics::gauge!(m::PARSERS_CONFIGURED).set(parsers.len() as f64);
        tracing::info!(
            parsers = parsers.len(),
            processors = instances.len(),
            strict = config.general.strict,
            dry_run = self.dry_run,
            "line pipeline built"
        );

        Ok(LinePipeline {
            parsers,
            lines_processed: AtomicU64::new(0),
            lines_matched: AtomicU64::new(0),
            tasks,
        })
    }
}

/// 설정된 프로세서 인스턴스
enum Instance {
    Statsd(Arc<dyn MetricSink>),
    Noop,
}

/// 파서의 라우트를 조립합니다.
///
/// 파서가 만들 수 없는 필드 참조는 strict 모드에서 에러, 그 외에는 경고입니다.
/// 경고로 넘어간 정의는 해당 필드가 없으므로 모든 라인에서 건너뛰어집니다.
fn build_routes(
    validator: &Validator,
    strict: bool,
    parser_name: &str,
    parser: &CompiledParser,
    raw: &Value,
    instances: &BTreeMap<&str, Instance>,
) -> Result<Vec<Route>, LogPipelineError> {
    let path = format!("parsers.{parser_name}.processors");
    let Some(table) = raw.get("processors").filter(|v| !v.is_null()) else {
        return Ok(Vec::new());
    };
    let Value::Object(table) = table else {
        return Err(SchemaError::TypeMismatch {
            path,
            expected: "map".to_owned(),
            found: json_type_name(table).to_owned(),
        }
        .into());
    };

    let mut routes = Vec::with_capacity(table.len());
    for (processor, params) in table {
        let Some(instance) = instances.get(processor.as_str()) else {
            return Err(LogPipelineError::UnknownProcessor {
                parser: parser_name.to_owned(),
                processor: processor.clone(),
            });
        };
        let route_path = format!("{path}.{processor}");

        let action = match instance {
            Instance::Statsd(sink) => {
                let schema = statsd::params_schema();
                let validated = validator.validate_at(&schema, params, &route_path)?;
                let empty = ValidatedMap::default();
                let map = validated.as_map().unwrap_or(&empty);
                let definitions = statsd::definitions(map, &route_path)?;

                for (idx, definition) in definitions.iter().enumerate() {
                    for (slot, field) in definition.field_references() {
                        if parser.provides(field) {
                            continue;
                        }
                        let path = format!("{route_path}.keys[{idx}].{slot}");
                        if strict {
                            return Err(LogPipelineError::UnknownFieldReference {
                                parser: parser_name.to_owned(),
                                field: field.to_owned(),
                                path,
                            });
                        }
                        tracing::warn!(
                            parser = %parser_name,
                            field,
                            path = %path,
                            "parser never provides referenced field, definition will always be skipped"
                        );
                    }
                }

                Processor::Statsd(StatsdProcessor::new(sink.clone(), definitions))
            }
            Instance::Noop => Processor::Noop(NoopProcessor),
        };

        routes.push(Route {
            processor: processor.clone(),
            action,
        });
    }

    Ok(routes)
}

/// 모듈 섹션의 `kind` 키를 해석합니다.
fn module_kind<K>(
    raw: &Value,
    path: &str,
    lookup: impl Fn(&str) -> Option<K>,
    expected: impl Fn() -> String,
) -> Result<K, LogPipelineError> {
    let kind_path = format!("{path}.kind");
    let kind = match raw.get("kind") {
        None | Some(Value::Null) => {
            return Err(SchemaError::MissingRequiredField { path: kind_path }.into());
        }
        Some(Value::String(kind)) => kind,
        Some(other) => {
            return Err(SchemaError::TypeMismatch {
                path: kind_path,
                expected: "string".to_owned(),
                found: json_type_name(other).to_owned(),
            }
            .into());
        }
    };

    lookup(kind).ok_or_else(|| LogPipelineError::UnknownModule {
        path: kind_path,
        kind: kind.clone(),
        expected: expected(),
    })
}

/// 예약 키를 제외하고 모듈 파라미터를 검증합니다.
fn validate_module(
    validator: &Validator,
    schema: &SchemaNode,
    raw: &Value,
    path: &str,
    reserved: &[&str],
) -> Result<Validated, LogPipelineError> {
    let mut params = raw.clone();
    if let Value::Object(object) = &mut params {
        for key in reserved {
            object.remove(*key);
        }
    }
    Ok(validator.validate_at(schema, &params, path)?)
}

fn names<const N: usize>(names: [&str; N]) -> String {
    names.join(", ")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
