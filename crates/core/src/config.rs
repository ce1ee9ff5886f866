//! 설정 관리 -- linestat.toml / linestat.json 파싱 및 런타임 설정
//!
//! [`LinestatConfig`]는 설정 파일의 최상위 구조체입니다.
//! `general`/`metrics` 섹션은 serde로 타입이 정해지고,
//! `processors`/`parsers` 섹션은 원시 트리로 보관했다가 각 모듈의
//! [`SchemaNode`](crate::schema::SchemaNode)로 검증합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LINESTAT_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`linestat.toml` 또는 `linestat.json`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), linestat_core::error::LinestatError> {
//! use linestat_core::config::LinestatConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LinestatConfig::load("linestat.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LinestatConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LinestatError};

/// 허용 로그 레벨
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// 허용 로그 형식
pub const LOG_FORMATS: &[&str] = &["json", "pretty"];

/// 설정 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (기본)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// 파일 확장자로 형식을 판별합니다. `.json`이 아니면 TOML입니다.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// linestat 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinestatConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 자체 메트릭(Prometheus) 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 프로세서 모듈 설정 (이름 → 원시 설정)
    #[serde(default)]
    pub processors: BTreeMap<String, serde_json::Value>,
    /// 파서 모듈 설정 (이름 → 원시 설정)
    #[serde(default)]
    pub parsers: BTreeMap<String, serde_json::Value>,
}

impl LinestatConfig {
    /// 설정 파일을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LinestatError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일을 로드합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LinestatError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LinestatError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LinestatError::Io(e)
            }
        })?;
        Self::parse_as(&content, ConfigFormat::from_path(path))
    }

    /// 지정한 형식으로 설정 문자열을 파싱합니다.
    pub fn parse_as(content: &str, format: ConfigFormat) -> Result<Self, LinestatError> {
        match format {
            ConfigFormat::Toml => Self::parse(content),
            ConfigFormat::Json => Self::parse_json(content),
        }
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LinestatError> {
        toml::from_str(toml_str).map_err(|e| {
            LinestatError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// JSON 문자열에서 설정을 파싱합니다.
    pub fn parse_json(json_str: &str) -> Result<Self, LinestatError> {
        serde_json::from_str(json_str).map_err(|e| {
            LinestatError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LINESTAT_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "LINESTAT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LINESTAT_GENERAL_LOG_FORMAT");
        override_bool(&mut self.general.strict, "LINESTAT_GENERAL_STRICT");

        override_bool(&mut self.metrics.enabled, "LINESTAT_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LINESTAT_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "LINESTAT_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 모듈 섹션의 상세 검증은 파이프라인 빌드 시 스키마로 수행됩니다.
    /// 여기서는 섹션이 맵인지만 확인합니다.
    pub fn validate(&self) -> Result<(), LinestatError> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", LOG_FORMATS.join(", ")),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "port must be non-zero when metrics are enabled".to_owned(),
            }
            .into());
        }

        if self.parsers.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "parsers".to_owned(),
                reason: "at least one parser must be configured".to_owned(),
            }
            .into());
        }

        for (section, modules) in [("processors", &self.processors), ("parsers", &self.parsers)] {
            for (name, raw) in modules {
                if !raw.is_object() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("{section}.{name}"),
                        reason: "module section must be a map".to_owned(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 모듈 섹션의 알 수 없는 키를 거부할지 여부
    pub strict: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            strict: false,
        }
    }
}

/// 자체 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9102,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}
