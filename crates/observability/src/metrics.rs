//! 会话指标收集模块
//!
//! 记录桥接会话的运行指标：读取行数、分发/丢弃的样本、sink 失败次数和设备时间滞后。

use std::collections::BTreeMap;

use metrics::{counter, gauge, histogram};

/// 记录一次串口读取
///
/// 空行（超时或解码失败）单独计数。
pub fn record_line_read(empty: bool) {
    if empty {
        counter!("telemetry_bridge_empty_reads_total").increment(1);
    } else {
        counter!("telemetry_bridge_lines_total").increment(1);
    }
}

/// 记录握手结果
pub fn record_handshake(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("telemetry_bridge_handshakes_total", "status" => status).increment(1);
    gauge!("telemetry_bridge_synchronized").set(if success { 1.0 } else { 0.0 });
}

/// 记录样本分发（至少尝试了一个 sink）
pub fn record_sample_dispatched(sequence: i64) {
    counter!("telemetry_bridge_samples_dispatched_total").increment(1);
    gauge!("telemetry_bridge_last_sequence").set(sequence as f64);
}

/// 记录样本被丢弃
pub fn record_sample_dropped(reason: &'static str) {
    counter!("telemetry_bridge_samples_dropped_total", "reason" => reason).increment(1);
}

/// 记录 sink 发送失败
pub fn record_sink_failure(sink_name: &str) {
    counter!(
        "telemetry_bridge_sink_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// 记录换算后的设备时间与主机接收时间之差 (毫秒)
///
/// 正值表示样本落后于主机时钟。
pub fn record_device_lag_ms(lag_ms: f64) {
    histogram!("telemetry_bridge_device_lag_ms").record(lag_ms);
}

/// 会话指标聚合器
///
/// 在内存中聚合指标，便于会话结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// 非空行数
    pub lines_read: u64,

    /// 空读取数（超时/解码失败）
    pub empty_reads: u64,

    /// 已分发样本数
    pub samples_dispatched: u64,

    /// 各原因丢弃数
    pub dropped: BTreeMap<&'static str, u64>,

    /// 各 sink 失败次数
    pub sink_failures: BTreeMap<String, u64>,

    /// 设备时间滞后统计 (毫秒)
    pub lag_stats: RunningStats,
}

impl SessionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_line(&mut self, empty: bool) {
        if empty {
            self.empty_reads += 1;
        } else {
            self.lines_read += 1;
        }
    }

    pub fn on_dispatched(&mut self) {
        self.samples_dispatched += 1;
    }

    pub fn on_dropped(&mut self, reason: &'static str) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn on_sink_failure(&mut self, sink_name: &str) {
        *self.sink_failures.entry(sink_name.to_string()).or_insert(0) += 1;
    }

    pub fn on_lag_ms(&mut self, lag_ms: f64) {
        self.lag_stats.push(lag_ms);
    }

    /// 丢弃总数
    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }

    /// 生成摘要报告
    pub fn summary(&self) -> SessionSummary {
        let samples = self.samples_dispatched + self.total_dropped();
        SessionSummary {
            lines_read: self.lines_read,
            empty_reads: self.empty_reads,
            samples_dispatched: self.samples_dispatched,
            samples_dropped: self.total_dropped(),
            drop_rate: if samples > 0 {
                self.total_dropped() as f64 / samples as f64 * 100.0
            } else {
                0.0
            },
            dropped_by_reason: self.dropped.clone(),
            sink_failures: self.sink_failures.clone(),
            device_lag_ms: StatsSummary::from(&self.lag_stats),
        }
    }
}

/// 会话摘要
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub lines_read: u64,
    pub empty_reads: u64,
    pub samples_dispatched: u64,
    pub samples_dropped: u64,
    pub drop_rate: f64,
    pub dropped_by_reason: BTreeMap<&'static str, u64>,
    pub sink_failures: BTreeMap<String, u64>,
    pub device_lag_ms: StatsSummary,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Lines read: {}", self.lines_read)?;
        writeln!(f, "Empty reads: {}", self.empty_reads)?;
        writeln!(f, "Samples dispatched: {}", self.samples_dispatched)?;
        writeln!(
            f,
            "Samples dropped: {} ({:.2}%)",
            self.samples_dropped, self.drop_rate
        )?;
        for (reason, count) in &self.dropped_by_reason {
            writeln!(f, "  {}: {}", reason, count)?;
        }
        if !self.sink_failures.is_empty() {
            writeln!(f, "Sink failures:")?;
            for (sink, count) in &self.sink_failures {
                writeln!(f, "  {}: {}", sink, count)?;
            }
        }
        writeln!(f, "Device lag (ms): {}", self.device_lag_ms)?;

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
