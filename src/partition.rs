//! 时间分桶策略
//!
//! 时间序列表的分区键里带一个合成的 bucket 列，值由 [`Bucketer`] 从行的
//! 时间字段算出。同一个时间戳在任何进程、任何时刻都必须落到同一个桶，
//! 否则读路径无法定位写路径写下的数据，所以策略只能是时间戳与自身配置
//! 的纯函数。

use std::fmt;
use std::time::Duration;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use crate::common::{Result, SchemaError};

/// 合成分桶列的列名
pub const BUCKET_FIELD: &str = "bucket";

// ── 策略接口 ──────────────────────────────────────────────────────────────────

/// `Display` 输出参与表名生成，不同策略的输出必须互不相同
pub trait Bucketer: fmt::Display + fmt::Debug + Send + Sync {
    /// 包含 `ts` 的桶的起点
    fn bucket(&self, ts: DateTime<Utc>) -> DateTime<Utc>;
    /// 下一个桶的起点
    fn next(&self, ts: DateTime<Utc>) -> DateTime<Utc>;
    /// 上一个桶的起点
    fn prev(&self, ts: DateTime<Utc>) -> DateTime<Utc>;

    /// `[start, end]` 覆盖到的全部桶，升序；start > end 时为空
    fn buckets_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let last = self.bucket(end);
        let mut cur = self.bucket(start);
        let mut out = Vec::new();
        while cur <= last {
            out.push(cur);
            let nxt = self.next(cur);
            // 到达 chrono 表示范围边界时 next 不再前进
            if nxt <= cur { break; }
            cur = nxt;
        }
        out
    }
}

// ── 固定时长 ──────────────────────────────────────────────────────────────────

/// 以 Unix 纪元为原点、固定时长的分桶
///
/// 对纪元前的时间戳同样向下取整，桶值随时间单调不减。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucketer {
    size:    Duration,
    size_ms: i64,
}

impl TimeBucketer {
    /// 时长须为正的整毫秒数
    pub fn new(size: Duration) -> Result<Self> {
        if size.is_zero() {
            return Err(SchemaError::InvalidBucketSize("bucket size must be positive".into()));
        }
        if size.subsec_nanos() % 1_000_000 != 0 {
            return Err(SchemaError::InvalidBucketSize(format!(
                "bucket size {size:?} is not a whole number of milliseconds"
            )));
        }
        let size_ms = i64::try_from(size.as_millis())
            .map_err(|_| SchemaError::InvalidBucketSize(format!("bucket size {size:?} too large")))?;
        Ok(Self { size, size_ms })
    }

    pub fn size(&self) -> Duration { self.size }

    fn bucket_ms(&self, ts: DateTime<Utc>) -> i64 {
        ts.timestamp_millis().div_euclid(self.size_ms) * self.size_ms
    }
}

impl Bucketer for TimeBucketer {
    fn bucket(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        from_millis(self.bucket_ms(ts))
    }
    fn next(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        from_millis(self.bucket_ms(ts).saturating_add(self.size_ms))
    }
    fn prev(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        from_millis(self.bucket_ms(ts).saturating_sub(self.size_ms))
    }
}

/// 与 Go `time.Duration` 的文本一致：`24h0m0s`、`1m30s`、`1.5s`、`250ms`
impl fmt::Display for TimeBucketer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.size.as_secs();
        let ms   = self.size.subsec_millis();
        if secs == 0 {
            return write!(f, "{ms}ms");
        }
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            write!(f, "{h}h{m}m")?;
        } else if m > 0 {
            write!(f, "{m}m")?;
        }
        write!(f, "{s}")?;
        if ms > 0 {
            let frac = format!("{ms:03}");
            write!(f, ".{}", frac.trim_end_matches('0'))?;
        }
        f.write_str("s")
    }
}

/// 超出 chrono 表示范围时饱和到边界
fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or(if ms < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

// ── 日历对齐 ──────────────────────────────────────────────────────────────────

/// 按 UTC 日历对齐的分桶（月、年长度不等）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarBucketer {
    Day,
    /// 周一为一周的第一天
    Week,
    Month,
    Year,
}

impl CalendarBucketer {
    fn start_date(self, d: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::Day   => Some(d),
            Self::Week  => d.checked_sub_days(Days::new(d.weekday().num_days_from_monday() as u64)),
            Self::Month => NaiveDate::from_ymd_opt(d.year(), d.month(), 1),
            Self::Year  => NaiveDate::from_ymd_opt(d.year(), 1, 1),
        };
        start.unwrap_or(d)
    }

    fn step_forward(self, d: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day   => d.checked_add_days(Days::new(1)),
            Self::Week  => d.checked_add_days(Days::new(7)),
            Self::Month => d.checked_add_months(Months::new(1)),
            Self::Year  => d.checked_add_months(Months::new(12)),
        }
    }

    fn step_back(self, d: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day   => d.checked_sub_days(Days::new(1)),
            Self::Week  => d.checked_sub_days(Days::new(7)),
            Self::Month => d.checked_sub_months(Months::new(1)),
            Self::Year  => d.checked_sub_months(Months::new(12)),
        }
    }
}

fn midnight(d: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))
}

impl Bucketer for CalendarBucketer {
    fn bucket(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        midnight(self.start_date(ts.date_naive()))
    }
    fn next(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.start_date(ts.date_naive());
        midnight(self.step_forward(start).unwrap_or(start))
    }
    fn prev(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.start_date(ts.date_naive());
        midnight(self.step_back(start).unwrap_or(start))
    }
}

impl fmt::Display for CalendarBucketer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Day   => "day",
            Self::Week  => "week",
            Self::Month => "month",
            Self::Year  => "year",
        };
        f.write_str(s)
    }
}
