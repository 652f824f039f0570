//! 表拓扑：按访问模式推导主键与表名
//!
//! | 拓扑                  | 分区键                    | 聚簇列         | 表名                                                  |
//! |-----------------------|---------------------------|----------------|-------------------------------------------------------|
//! | 普通表                | 调用方给定                | 调用方给定     | `<base>__<pk…>__<ck…>`                                |
//! | map                   | `id`                      | —              | `<base>_map_<id>`                                     |
//! | multimap              | `index`                   | `id`           | `<base>_multimap_<index>_<id>`                        |
//! | 多键 multimap         | `index…`                  | `id…`          | `<base>_multimapMk`                                   |
//! | 时间序列              | `bucket`                  | `time, id`     | `<base>_timeSeries_<time>_<id>_<size>`                |
//! | 多索引时间序列        | `index…, bucket`          | `time, id`     | `<base>_multiTimeSeries_<index…>_<time>_<id>_<策略>` |
//!
//! 表名是参数的纯函数，且对索引列顺序敏感。

use std::ops::Deref;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::common::Keys;
use crate::meta::Options;
use crate::partition::{Bucketer, TimeBucketer, BUCKET_FIELD};
use crate::table::Table;

// ── 推导 ──────────────────────────────────────────────────────────────────────

/// 推导结果：表名 + 主键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScheme {
    pub name: String,
    pub keys: Keys,
}

pub fn simple(base: &str, keys: Keys) -> TableScheme {
    let name = format!(
        "{base}__{}__{}",
        keys.partition_keys.join("_"),
        keys.clustering_columns.join("_"),
    );
    TableScheme { name, keys }
}

pub fn map(base: &str, id: &str) -> TableScheme {
    TableScheme {
        name: format!("{base}_map_{id}"),
        keys: Keys::partition([id]),
    }
}

pub fn multimap(base: &str, index_field: &str, id: &str) -> TableScheme {
    TableScheme {
        name: format!("{base}_multimap_{index_field}_{id}"),
        keys: Keys::new([index_field], [id]),
    }
}

/// 表名固定后缀，不区分键列组合
pub fn multimap_multi_key(base: &str, index_fields: &[&str], id_fields: &[&str]) -> TableScheme {
    TableScheme {
        name: format!("{base}_multimapMk"),
        keys: Keys::new(index_fields.iter().copied(), id_fields.iter().copied()),
    }
}

pub fn time_series(base: &str, time_field: &str, id_field: &str, bucketer: &TimeBucketer) -> TableScheme {
    TableScheme {
        name: format!("{base}_timeSeries_{time_field}_{id_field}_{bucketer}"),
        keys: Keys::new([BUCKET_FIELD], [time_field, id_field]),
    }
}

pub fn multi_time_series(
    base:         &str,
    index_fields: &[&str],
    time_field:   &str,
    id_field:     &str,
    bucketer:     &dyn Bucketer,
) -> TableScheme {
    let partition = index_fields.iter().copied().chain([BUCKET_FIELD]);
    TableScheme {
        name: format!(
            "{base}_multiTimeSeries_{}_{time_field}_{id_field}_{bucketer}",
            index_fields.join("_"),
        ),
        keys: Keys::new(partition, [time_field, id_field]),
    }
}

// ── 拓扑句柄 ──────────────────────────────────────────────────────────────────
//
// 每个句柄都 Deref 到底层 Table，额外记住自己的键列，时间序列还持有分桶策略。

macro_rules! deref_table {
    ($($ty:ident),*) => {
        $(
            impl Deref for $ty {
                type Target = dyn Table;
                fn deref(&self) -> &Self::Target { self.table.as_ref() }
            }

            impl $ty {
                pub fn table(&self) -> &Arc<dyn Table> { &self.table }
            }
        )*
    };
}

deref_table!(MapTable, MultimapTable, MultimapMkTable, TimeSeriesTable, MultiTimeSeriesTable);

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

pub struct MapTable {
    table:    Arc<dyn Table>,
    id_field: String,
}

impl MapTable {
    pub fn new(table: Arc<dyn Table>, id_field: &str) -> Self {
        Self { table, id_field: id_field.into() }
    }
    pub fn id_field(&self) -> &str { &self.id_field }
    pub fn with_options(&self, options: Options) -> Self {
        Self { table: self.table.with_options(options), id_field: self.id_field.clone() }
    }
}

pub struct MultimapTable {
    table:       Arc<dyn Table>,
    index_field: String,
    id_field:    String,
}

impl MultimapTable {
    pub fn new(table: Arc<dyn Table>, index_field: &str, id_field: &str) -> Self {
        Self { table, index_field: index_field.into(), id_field: id_field.into() }
    }
    pub fn index_field(&self) -> &str { &self.index_field }
    pub fn id_field(&self) -> &str { &self.id_field }
    pub fn with_options(&self, options: Options) -> Self {
        Self {
            table:       self.table.with_options(options),
            index_field: self.index_field.clone(),
            id_field:    self.id_field.clone(),
        }
    }
}

pub struct MultimapMkTable {
    table:        Arc<dyn Table>,
    index_fields: Vec<String>,
    id_fields:    Vec<String>,
}

impl MultimapMkTable {
    pub fn new(table: Arc<dyn Table>, index_fields: &[&str], id_fields: &[&str]) -> Self {
        Self { table, index_fields: owned(index_fields), id_fields: owned(id_fields) }
    }
    pub fn index_fields(&self) -> &[String] { &self.index_fields }
    pub fn id_fields(&self) -> &[String] { &self.id_fields }
    pub fn with_options(&self, options: Options) -> Self {
        Self {
            table:        self.table.with_options(options),
            index_fields: self.index_fields.clone(),
            id_fields:    self.id_fields.clone(),
        }
    }
}

pub struct TimeSeriesTable {
    table:      Arc<dyn Table>,
    time_field: String,
    id_field:   String,
    bucketer:   TimeBucketer,
}

impl TimeSeriesTable {
    pub fn new(table: Arc<dyn Table>, time_field: &str, id_field: &str, bucketer: TimeBucketer) -> Self {
        Self { table, time_field: time_field.into(), id_field: id_field.into(), bucketer }
    }
    pub fn time_field(&self) -> &str { &self.time_field }
    pub fn id_field(&self) -> &str { &self.id_field }
    pub fn bucketer(&self) -> &TimeBucketer { &self.bucketer }

    /// 写路径：行的 bucket 列取值
    pub fn bucket_for(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        self.bucketer.bucket(ts)
    }

    /// 读路径：时间范围覆盖的全部分区
    pub fn buckets_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.bucketer.buckets_between(start, end)
    }

    pub fn with_options(&self, options: Options) -> Self {
        Self {
            table:      self.table.with_options(options),
            time_field: self.time_field.clone(),
            id_field:   self.id_field.clone(),
            bucketer:   self.bucketer,
        }
    }
}

pub struct MultiTimeSeriesTable {
    table:        Arc<dyn Table>,
    index_fields: Vec<String>,
    time_field:   String,
    id_field:     String,
    bucketer:     Arc<dyn Bucketer>,
}

impl MultiTimeSeriesTable {
    pub fn new(
        table:        Arc<dyn Table>,
        index_fields: &[&str],
        time_field:   &str,
        id_field:     &str,
        bucketer:     Arc<dyn Bucketer>,
    ) -> Self {
        Self {
            table,
            index_fields: owned(index_fields),
            time_field:   time_field.into(),
            id_field:     id_field.into(),
            bucketer,
        }
    }
    pub fn index_fields(&self) -> &[String] { &self.index_fields }
    pub fn time_field(&self) -> &str { &self.time_field }
    pub fn id_field(&self) -> &str { &self.id_field }
    pub fn bucketer(&self) -> &dyn Bucketer { self.bucketer.as_ref() }

    pub fn bucket_for(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        self.bucketer.bucket(ts)
    }

    pub fn buckets_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.bucketer.buckets_between(start, end)
    }

    pub fn with_options(&self, options: Options) -> Self {
        Self {
            table:        self.table.with_options(options),
            index_fields: self.index_fields.clone(),
            time_field:   self.time_field.clone(),
            id_field:     self.id_field.clone(),
            bucketer:     self.bucketer.clone(),
        }
    }
}
