//! 表 / UDT 的解析后元数据与建表选项

use serde::{Deserialize, Serialize};
use crate::common::{ClusteringOrderColumn, Keys, Result, SchemaError};
use crate::field_type::{Field, RecordShape, Shape};

/// 将行形状拆成字段；非结构体属于调用方错误
pub fn record_of<'a>(row: &'a Shape) -> Result<&'a RecordShape> {
    row.as_record()
        .ok_or_else(|| SchemaError::UnrecognizedRowShape(row.to_string()))
}

// ── 表元数据 ──────────────────────────────────────────────────────────────────

/// 创建表句柄时一次性构建，此后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub keyspace: String,
    pub name:     String,
    /// 行结构的完整类型路径
    pub entity:   String,
    pub keys:     Keys,
    pub fields:   Vec<Field>,
}

impl TableInfo {
    pub fn new(keyspace: &str, name: &str, keys: Keys, row: &RecordShape) -> Self {
        Self {
            keyspace: keyspace.into(),
            name:     name.into(),
            entity:   row.name.clone(),
            keys,
            fields:   row.fields.clone(),
        }
    }

    /// 追加（或替换同名的，大小写不敏感）合成字段，如时间序列的 bucket 列
    pub fn with_field(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|f| f.name.eq_ignore_ascii_case(&field.name)) {
            Some(existing) => *existing = field,
            None           => self.fields.push(field),
        }
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }
}

// ── UDT 元数据 ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub keyspace: String,
    pub name:     String,
    pub entity:   String,
    pub fields:   Vec<Field>,
}

impl TypeInfo {
    pub fn new(keyspace: &str, name: &str, entity: &RecordShape) -> Self {
        Self {
            keyspace: keyspace.into(),
            name:     name.into(),
            entity:   entity.name.clone(),
            fields:   entity.fields.clone(),
        }
    }
}

// ── 建表选项 ──────────────────────────────────────────────────────────────────

/// 影响 DDL 的表选项，可直接从配置反序列化
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// 为空则不生成 CLUSTERING ORDER 子句
    pub clustering_order: Vec<ClusteringOrderColumn>,
    pub compact_storage:  bool,
    /// 如 `LZ4Compressor`；为空则不生成 compression 子句
    pub compressor:       Option<String>,
}

impl Options {
    pub fn with_clustering_order(mut self, order: Vec<ClusteringOrderColumn>) -> Self {
        self.clustering_order = order; self
    }
    pub fn compact(mut self) -> Self {
        self.compact_storage = true; self
    }
    pub fn with_compressor(mut self, compressor: &str) -> Self {
        self.compressor = Some(compressor.into()); self
    }

    /// 以 `other` 中的非默认项覆盖自身
    pub fn merge(&self, other: &Options) -> Options {
        let mut out = self.clone();
        if !other.clustering_order.is_empty() {
            out.clustering_order = other.clustering_order.clone();
        }
        if other.compact_storage {
            out.compact_storage = true;
        }
        if other.compressor.as_deref().is_some_and(|c| !c.is_empty()) {
            out.compressor = other.compressor.clone();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::ColumnShape;

    struct Event { id: String, at: i64 }
    crate::record_shape!(Event { id: String, at: i64 });

    #[test]
    fn non_record_row_is_rejected() {
        assert!(matches!(record_of(&i32::shape()), Err(SchemaError::UnrecognizedRowShape(_))));
        assert!(record_of(&Event::shape()).is_ok());
    }

    #[test]
    fn synthetic_field_appends_or_replaces() {
        let shape = Event::shape();
        let row = record_of(&shape).unwrap();
        let info = TableInfo::new("ks", "events", Keys::partition(["id"]), row)
            .with_field(Field::new("bucket", Shape::Timestamp))
            .with_field(Field::new("at", Shape::Timestamp));
        let names: Vec<_> = info.field_names().collect();
        assert_eq!(names, ["id", "at", "bucket"]);
        assert_eq!(info.fields[1].shape, Shape::Timestamp);
        assert!(info.has_field("ID"));
    }

    #[test]
    fn synthetic_field_replaces_case_insensitively() {
        let row = RecordShape::new("Legacy", vec![
            Field::new("id", Shape::Str),
            Field::new("Bucket", Shape::I64),
        ]);
        let info = TableInfo::new("ks", "legacy", Keys::partition(["id"]), &row)
            .with_field(Field::new("bucket", Shape::Timestamp));
        assert_eq!(info.fields.len(), 2);
        assert_eq!(info.fields[1], Field::new("bucket", Shape::Timestamp));
    }

    #[test]
    fn merge_overlays_non_defaults() {
        let base = Options::default().with_compressor("LZ4Compressor");
        let merged = base.merge(&Options::default().compact());
        assert!(merged.compact_storage);
        assert_eq!(merged.compressor.as_deref(), Some("LZ4Compressor"));

        let order = vec![ClusteringOrderColumn::desc("at")];
        let merged = merged.merge(&Options::default().with_clustering_order(order.clone()));
        assert_eq!(merged.clustering_order, order);
    }

    #[test]
    fn options_from_config() {
        let json = r#"{
            "clustering_order": [{"column": "at", "direction": "desc"}, {"column": "id"}],
            "compressor": "LZ4Compressor"
        }"#;
        let opts: Options = serde_json::from_str(json).unwrap();
        assert_eq!(
            opts.clustering_order,
            vec![ClusteringOrderColumn::desc("at"), ClusteringOrderColumn::asc("id")],
        );
        assert!(!opts.compact_storage);
        assert_eq!(opts.compressor.as_deref(), Some("LZ4Compressor"));
    }
}
