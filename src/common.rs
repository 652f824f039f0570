//! 全局基础类型与错误定义

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 执行器返回的任意错误（原样透传，不做重试）
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ── 主键声明 ──────────────────────────────────────────────────────────────────

/// 分区键 + 聚簇列
///
/// 两个序列内的顺序决定物理主键顺序与分区内排序；二者不得相交，
/// 可建表的 Keys 分区键必须非空。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keys {
    pub partition_keys:     Vec<String>,
    #[serde(default)]
    pub clustering_columns: Vec<String>,
    /// 无聚簇列时按单层括号生成主键（兼容旧表）
    #[serde(default)]
    pub compound:           bool,
}

impl Keys {
    pub fn new<P, C>(partition_keys: P, clustering_columns: C) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            partition_keys:     partition_keys.into_iter().map(Into::into).collect(),
            clustering_columns: clustering_columns.into_iter().map(Into::into).collect(),
            compound:           false,
        }
    }

    /// 仅分区键
    pub fn partition<P>(partition_keys: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self::new(partition_keys, Vec::<String>::new())
    }

    pub fn compound(mut self) -> Self {
        self.compound = true; self
    }

    /// 校验分区键非空、两组键互不相交（大小写不敏感）
    pub fn validate(&self) -> Result<()> {
        if self.partition_keys.is_empty() {
            return Err(SchemaError::InvalidKeys("partition key must not be empty".into()));
        }
        for c in &self.clustering_columns {
            if self.partition_keys.iter().any(|p| p.eq_ignore_ascii_case(c)) {
                return Err(SchemaError::InvalidKeys(format!(
                    "column `{c}` is both a partition key and a clustering column"
                )));
            }
        }
        Ok(())
    }

    pub fn is_clustering_column(&self, name: &str) -> bool {
        self.clustering_columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}

// ── 枚举 ──────────────────────────────────────────────────────────────────────

/// 建表/建类型语句的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// `CREATE TABLE`
    Create,
    /// `CREATE TABLE IF NOT EXISTS`
    IfNotExists,
}

impl CreateMode {
    pub fn keyword(self, object: &str) -> String {
        match self {
            Self::Create      => format!("CREATE {object}"),
            Self::IfNotExists => format!("CREATE {object} IF NOT EXISTS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc  => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// 聚簇排序中的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringOrderColumn {
    pub column:    String,
    #[serde(default)]
    pub direction: Direction,
}

impl ClusteringOrderColumn {
    pub fn asc(column: &str) -> Self {
        Self { column: column.into(), direction: Direction::Asc }
    }
    pub fn desc(column: &str) -> Self {
        Self { column: column.into(), direction: Direction::Desc }
    }
}

// ── 错误 ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("unsupported map key type: {0}")]
    UnsupportedMapKeyType(String),
    #[error("unrecognized row type: {0}")]
    UnrecognizedRowShape(String),
    #[error("invalid keys: {0}")]
    InvalidKeys(String),
    #[error("invalid bucket size: {0}")]
    InvalidBucketSize(String),
    #[error("catalog error: {0}")]
    Catalog(#[source] BoxError),
    #[error("unexpected value in catalog column `{column}`: {value}")]
    UnexpectedCatalogValue { column: String, value: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_reject_empty_partition() {
        let keys = Keys::new(Vec::<String>::new(), ["id"]);
        assert!(matches!(keys.validate(), Err(SchemaError::InvalidKeys(_))));
    }

    #[test]
    fn keys_reject_overlap_case_insensitively() {
        let keys = Keys::new(["Id"], ["id"]);
        assert!(matches!(keys.validate(), Err(SchemaError::InvalidKeys(_))));
        assert!(Keys::new(["a", "b"], ["c"]).validate().is_ok());
    }

    #[test]
    fn create_mode_keyword() {
        assert_eq!(CreateMode::Create.keyword("TABLE"), "CREATE TABLE");
        assert_eq!(CreateMode::IfNotExists.keyword("TYPE"), "CREATE TYPE IF NOT EXISTS");
    }
}
