//! 메트릭 싱크 구현
//!
//! - [`StatsdClient`]: StatsD UDP 클라이언트 (비동기 전송, fire-and-forget)
//! - [`MemorySink`]: 전달된 메트릭을 메모리에 기록 (테스트/디버깅용)
//! - [`DiscardSink`]: 모든 메트릭을 버림 (설정 검증 전용 실행)
//!
//! # StatsD 와이어 형식
//! ```text
//! <prefix>.<key>:<value>|c    카운터
//! <prefix>.<key>:<value>|g    게이지
//! <prefix>.<key>:<value>|ms   타이머
//! ```
//! 접두어가 비어 있으면 `.` 없이 key만 사용합니다.
//! 음수 게이지는 `<key>:0|g`와 `<key>:<value>|g` 두 줄을 한 데이터그램으로 보냅니다.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use linestat_core::metrics as m;
use linestat_core::pipeline::MetricSink;

use crate::error::LogPipelineError;
use crate::processor::StatsdSetup;

/// 전송 큐 기본 용량 (패킷 수)
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// StatsD UDP 클라이언트
///
/// 메트릭은 bounded 채널로 백그라운드 전송 태스크에 넘겨지며,
/// 호출자는 전송 완료를 기다리지 않습니다. 채널이 가득 차면 메트릭을 버립니다.
pub struct StatsdClient {
    prefix: String,
    tx: mpsc::Sender<String>,
    dropped: AtomicU64,
}

impl StatsdClient {
    /// 수집기 주소를 해석하고 전송 태스크를 시작합니다.
    ///
    /// 반환된 [`JoinHandle`]은 클라이언트가 drop되어 큐가 비워지면 종료됩니다.
    pub async fn connect(
        setup: &StatsdSetup,
        capacity: usize,
    ) -> Result<(Self, JoinHandle<()>), LogPipelineError> {
        let target = tokio::net::lookup_host((setup.host.as_str(), setup.port))
            .await
            .map_err(|e| {
                LogPipelineError::Sink(format!(
                    "cannot resolve {}:{}: {e}",
                    setup.host, setup.port
                ))
            })?
            .next()
            .ok_or_else(|| {
                LogPipelineError::Sink(format!("no address for {}:{}", setup.host, setup.port))
            })?;

        let bind_addr = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(target).await?;

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(send_loop(socket, rx));

        tracing::info!(
            target_addr = %target,
            prefix = %setup.prefix,
            "statsd client connected"
        );

        Ok((Self::from_sender(setup.prefix.clone(), tx), handle))
    }

    pub(crate) fn from_sender(prefix: String, tx: mpsc::Sender<String>) -> Self {
        Self {
            prefix,
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// 메트릭 이름 접두어
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 큐가 가득 차거나 닫혀 버려진 메트릭 수
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, key: &str, value: i64, suffix: &str) {
        let packet = format_packet(&self.prefix, key, value, suffix);
        if let Err(e) = self.tx.try_send(packet) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::STATSD_DROPPED_TOTAL).increment(1);
            tracing::debug!(key, reason = %e, "statsd metric dropped");
        }
    }
}

impl MetricSink for StatsdClient {
    fn increment(&self, key: &str, amount: i64) {
        self.send(key, amount, "c");
    }

    fn gauge(&self, key: &str, value: i64) {
        self.send(key, value, "g");
    }

    fn timing(&self, key: &str, duration_ms: i64) {
        self.send(key, duration_ms, "ms");
    }
}

async fn send_loop(socket: UdpSocket, mut rx: mpsc::Receiver<String>) {
    while let Some(packet) = rx.recv().await {
        if let Err(e) = socket.send(packet.as_bytes()).await {
            metrics::counter!(m::STATSD_SEND_ERRORS_TOTAL).increment(1);
            tracing::debug!(error = %e, "statsd send failed");
        }
    }
    tracing::debug!("statsd send loop finished");
}

/// StatsD 패킷을 만듭니다.
///
/// key의 `:`, `|`, `@`와 공백 문자는 `_`로 치환됩니다.
/// 부호 있는 게이지는 증감으로 해석되므로, 음수 게이지는 `0`으로 먼저 설정한 뒤
/// 같은 데이터그램에서 값을 뺍니다 (`key:0|g\nkey:-5|g`).
pub fn format_packet(prefix: &str, key: &str, value: i64, suffix: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + key.len() + 1);
    if !prefix.is_empty() {
        name.push_str(prefix);
        name.push('.');
    }
    name.extend(key.chars().map(|c| match c {
        ':' | '|' | '@' => '_',
        c if c.is_whitespace() => '_',
        c => c,
    }));

    if suffix == "g" && value < 0 {
        format!("{name}:0|g\n{name}:{value}|g")
    } else {
        format!("{name}:{value}|{suffix}")
    }
}

/// 싱크에 전달된 메트릭 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// 카운터 증가
    Increment(String, i64),
    /// 게이지 설정
    Gauge(String, i64),
    /// 타이머 기록
    Timing(String, i64),
}

impl Emission {
    /// 카운터 증가
    pub fn increment(key: &str, amount: i64) -> Self {
        Self::Increment(key.to_owned(), amount)
    }

    /// 게이지 설정
    pub fn gauge(key: &str, value: i64) -> Self {
        Self::Gauge(key.to_owned(), value)
    }

    /// 타이머 기록
    pub fn timing(key: &str, duration_ms: i64) -> Self {
        Self::Timing(key.to_owned(), duration_ms)
    }
}

/// 메모리 기록 싱크
#[derive(Debug, Default)]
pub struct MemorySink {
    emissions: Mutex<Vec<Emission>>,
}

impl MemorySink {
    /// 지금까지 기록된 메트릭 (전달 순서)
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    fn record(&self, emission: Emission) {
        if let Ok(mut emissions) = self.emissions.lock() {
            emissions.push(emission);
        }
    }
}

impl MetricSink for MemorySink {
    fn increment(&self, key: &str, amount: i64) {
        self.record(Emission::increment(key, amount));
    }

    fn gauge(&self, key: &str, value: i64) {
        self.record(Emission::gauge(key, value));
    }

    fn timing(&self, key: &str, duration_ms: i64) {
        self.record(Emission::timing(key, duration_ms));
    }
}

/// 모든 메트릭을 버리는 싱크
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl MetricSink for DiscardSink {
    fn increment(&self, _key: &str, _amount: i64) {}

    fn gauge(&self, _key: &str, _value: i64) {}

    fn timing(&self, _key: &str, _duration_ms: i64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn packet_format_per_kind() {
        assert_eq!(format_packet("web", "status.200", 1, "c"), "web.status.200:1|c");
        assert_eq!(format_packet("web", "bytes", 1024, "g"), "web.bytes:1024|g");
        assert_eq!(format_packet("web", "latency", 13, "ms"), "web.latency:13|ms");
    }

    #[test]
    fn empty_prefix_has_no_dot() {
        assert_eq!(format_packet("", "hits", 1, "c"), "hits:1|c");
    }

    #[test]
    fn key_is_sanitized() {
        assert_eq!(
            format_packet("p", "a:b|c@d e\tf", -3, "c"),
            "p.a_b_c_d_e_f:-3|c"
        );
    }

    #[test]
    fn negative_gauge_is_reset_then_set() {
        assert_eq!(format_packet("web", "temp", -5, "g"), "web.temp:0|g\nweb.temp:-5|g");
        assert_eq!(format_packet("", "temp", 0, "g"), "temp:0|g");
        // 타이머/카운터는 음수도 그대로
        assert_eq!(format_packet("web", "delta", -5, "ms"), "web.delta:-5|ms");
    }

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::default();
        sink.gauge("b", 2);
        sink.increment("a", 1);
        sink.timing("c", 3);
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
    fn full_queue_drops_metrics() {
        let (tx, _rx) = mpsc::channel(1);
        let client = StatsdClient::from_sender("p".to_owned(), tx);
        client.increment("a", 1);
        client.increment("b", 1);
        client.increment("c", 1);
        assert_eq!(client.dropped(), 2);
    }

    #[test]
    fn closed_queue_drops_metrics() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let client = StatsdClient::from_sender(String::new(), tx);
        client.gauge("a", 1);
        assert_eq!(client.dropped(), 1);
    }

    #[tokio::test]
    async fn client_sends_udp_datagrams() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let setup = StatsdSetup {
            prefix: "web".to_owned(),
            host: "127.0.0.1".to_owned(),
            port,
        };

        let (client, handle) = StatsdClient::connect(&setup, 16).await.unwrap();
        assert_eq!(client.prefix(), "web");
        client.increment("status.200", 1);
        client.gauge("bytes", 1024);
        client.gauge("temp", -5);

        let mut buf = [0u8; 512];
        let mut received = Vec::new();
        for _ in 0..3 {
            let n = tokio::time::timeout(Duration::from_secs(5), server.recv(&mut buf))
                .await
                .expect("datagram within timeout")
                .unwrap();
            received.push(String::from_utf8_lossy(&buf[..n]).into_owned());
        }
        assert_eq!(
            received,
            [
                "web.status.200:1|c",
                "web.bytes:1024|g",
                "web.temp:0|g\nweb.temp:-5|g"
            ]
        );

        drop(client);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("send loop exits after client drop")
            .unwrap();
    }

    #[tokio::test]
    async fn unresolvable_host_is_sink_error() {
        let setup = StatsdSetup {
            prefix: "web".to_owned(),
            host: "invalid host name".to_owned(),
            port: 8125,
        };
        let err = StatsdClient::connect(&setup, 16).await.err().unwrap();
        assert!(matches!(err, LogPipelineError::Sink(_)));
    }
}
