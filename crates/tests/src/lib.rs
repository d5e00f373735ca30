//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置合约测试
//! - 模拟 e2e 测试（无需真实设备）
//! - 本地回环上的 Carbon / Loki 线协议测试

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Utc};
    use contracts::{ContractError, LogRecord, LogSink, MetricPoint, MetricsSink};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    pub fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// In-memory sink that records every payload
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub points: Arc<Mutex<Vec<MetricPoint>>>,
        pub records: Arc<Mutex<Vec<LogRecord>>>,
    }

    impl MetricsSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_points(&mut self, points: &[MetricPoint]) -> Result<(), ContractError> {
            self.points.lock().unwrap().extend_from_slice(points);
            Ok(())
        }
    }

    impl LogSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_record(&mut self, record: &LogRecord) -> Result<(), ContractError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    /// Port with no listener behind it
    pub async fn dead_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// One-shot HTTP server: answers a single request with `status` and returns its body
    pub async fn one_shot_http(status: u16) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/loki/api/v1/push", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            let header_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);

            while buf.len() < header_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before body");
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status} Test\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap()
        });

        (url, handle)
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_empty_config_is_valid() {
        let config = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        assert_eq!(config.version, contracts::ConfigVersion::V1);
        assert_eq!(config.metrics.prefix, "arduino.fornello");
        assert_eq!(config.logs.source, "serialport");
    }

    #[test]
    fn test_config_toml_roundtrip_keeps_overrides() {
        let mut config = contracts::BridgeConfig::default();
        config.serial.baud_rate = 57_600;
        config.observability.metrics_port = Some(9100);

        let toml = ConfigLoader::to_toml(&config).unwrap();
        let back = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(back.serial.baud_rate, 57_600);
        assert_eq!(back.observability.metrics_port, Some(9100));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use contracts::{ContractError, LogRecord, LogSink, LogSinkConfig};
    use dispatcher::{pickle::frame_points, CarbonSink, Delivery, DispatchOutcome, Dispatcher, LokiSink};
    use ingestion::{parse_line, MockLineSource};
    use sync_engine::{FixedClock, SetupFailed, SyncState};
    use telemetry_bridge::{CliError, Session, ShutdownFlag};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::support::{dead_port, one_shot_http, t0, RecordingSink};

    /// End-to-end test: MockLineSource -> handshake -> Dispatcher -> recording sinks
    #[tokio::test]
    async fn test_e2e_mock_session() {
        let metrics = RecordingSink::default();
        let logs = RecordingSink::default();
        let source = MockLineSource::new([
            "booting",
            "READY",
            "time:1000",
            "temp:20.5,time:1500",
            "",
            "temp:21.0,hum:40,time:3000",
            "time:4000",
        ]);
        let handle = source.handle();

        let stats = Session::new(
            source,
            Dispatcher::new("arduino.fornello", metrics.clone(), logs.clone()),
            ShutdownFlag::new(),
        )
        .retry_budget(5)
        .with_clock(FixedClock(t0()))
        .run()
        .await
        .unwrap();

        let points = metrics.points.lock().unwrap();
        let summary: Vec<_> = points
            .iter()
            .map(|p| (p.path.as_str(), p.epoch_seconds, p.value))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("arduino.fornello.temp", 1_700_000_000, 20.5),
                ("arduino.fornello.temp", 1_700_000_002, 21.0),
                ("arduino.fornello.hum", 1_700_000_002, 40.0),
            ]
        );

        let records = logs.records.lock().unwrap();
        assert_eq!(
            *records,
            vec![
                LogRecord {
                    epoch_nanos: 1_700_000_000_500_000_000,
                    line: "temp:20.5,time:1500".into()
                },
                LogRecord {
                    epoch_nanos: 1_700_000_002_000_000_000,
                    line: "temp:21.0,hum:40,time:3000".into()
                },
                LogRecord {
                    epoch_nanos: 1_700_000_003_000_000_000,
                    line: "time:4000".into()
                },
            ]
        );

        assert_eq!(stats.last_sequence, 2);
        assert_eq!(stats.samples_dispatched(), 3);
        assert_eq!(stats.samples_dropped(), 0);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_e2e_handshake_missing_time_is_fatal() {
        let source = MockLineSource::new(["READY", "temp:20.5"]);
        let handle = source.handle();
        let result = Session::new(
            source,
            Dispatcher::new("p", RecordingSink::default(), RecordingSink::default()),
            ShutdownFlag::new(),
        )
        .run()
        .await;

        assert!(matches!(
            result,
            Err(CliError::Handshake(SetupFailed::MissingTimeField { .. }))
        ));
        assert!(handle.is_closed());
    }

    /// Termination requested before the device ever reports READY
    #[tokio::test]
    async fn test_e2e_shutdown_before_ready() {
        let source = MockLineSource::new(["boot", "boot", "READY", "time:1", "a:1,time:2"]);
        let handle = source.handle();
        let metrics = RecordingSink::default();
        let shutdown = ShutdownFlag::new();
        shutdown.request();

        let stats = Session::new(
            source,
            Dispatcher::new("p", metrics.clone(), RecordingSink::default()),
            shutdown,
        )
        .run()
        .await
        .unwrap();

        assert!(stats.shutdown_requested);
        assert_eq!(handle.reads(), 0);
        assert!(handle.is_closed());
        assert!(metrics.points.lock().unwrap().is_empty());
    }

    /// Neither sink reachable: every sample is attempted on both and the loop keeps going
    #[tokio::test]
    async fn test_e2e_unreachable_sinks_do_not_stop_session() {
        let carbon = CarbonSink::new(
            "carbon",
            format!("127.0.0.1:{}", dead_port().await),
            Duration::from_millis(500),
        );
        let loki = LokiSink::new(
            "loki",
            &LogSinkConfig {
                url: format!("http://127.0.0.1:{}/loki/api/v1/push", dead_port().await),
                request_timeout_ms: 500,
                ..Default::default()
            },
        )
        .unwrap();

        let stats = Session::new(
            MockLineSource::new(["READY", "time:0", "a:1,time:10", "a:2,time:20"]),
            Dispatcher::new("p", carbon, loki),
            ShutdownFlag::new(),
        )
        .with_clock(FixedClock(t0()))
        .run()
        .await
        .unwrap();

        assert_eq!(stats.samples_dispatched(), 2);
        assert_eq!(stats.metrics.sink_failures.get("carbon"), Some(&2));
        assert_eq!(stats.metrics.sink_failures.get("loki"), Some(&2));
        for (_, snapshot) in &stats.sinks {
            assert_eq!(snapshot.failure_count, 2);
            assert_eq!(snapshot.write_count, 0);
        }
    }

    /// Carbon receives the exact framed pickle batch; Loki is down
    #[tokio::test]
    async fn test_e2e_carbon_wire_format() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let carbon = CarbonSink::new("carbon", addr.to_string(), Duration::from_secs(1));
        let loki = LokiSink::new(
            "loki",
            &LogSinkConfig {
                url: format!("http://127.0.0.1:{}/loki/api/v1/push", dead_port().await),
                ..Default::default()
            },
        )
        .unwrap();
        let mut dispatcher = Dispatcher::new("arduino.fornello", carbon, loki);

        let state = SyncState::ready(1000, t0());
        let line = "temp:20.5,time:1500";
        let outcome = dispatcher.dispatch(&parse_line(line), line, &state).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Attempted {
                metrics: Delivery::Sent,
                logs: Delivery::Failed
            }
        );

        let expected = dispatcher::build_payload("arduino.fornello", &parse_line(line), line, &state)
            .unwrap()
            .points;
        assert_eq!(server.await.unwrap(), frame_points(&expected).unwrap().to_vec());
    }

    #[tokio::test]
    async fn test_e2e_loki_push_body() {
        let (url, server) = one_shot_http(204).await;
        let mut loki = LokiSink::new(
            "loki",
            &LogSinkConfig {
                url,
                ..Default::default()
            },
        )
        .unwrap();

        let record = LogRecord {
            epoch_nanos: 1_700_000_000_500_000_000,
            line: "temp:20.5,time:1500".into(),
        };
        loki.send_record(&record).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "streams": [{
                    "stream": { "source": "serialport" },
                    "values": [["1700000000500000000", "temp:20.5,time:1500"]]
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_e2e_loki_non_2xx_is_rejected() {
        let (url, server) = one_shot_http(500).await;
        let mut loki = LokiSink::new(
            "loki",
            &LogSinkConfig {
                url,
                ..Default::default()
            },
        )
        .unwrap();

        let record = LogRecord {
            epoch_nanos: 1,
            line: "time:1".into(),
        };
        let result = loki.send_record(&record).await;
        server.await.unwrap();

        assert!(matches!(
            result,
            Err(ContractError::SinkRejected { status: 500, .. })
        ));
    }
}
