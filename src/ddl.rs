//! DDL 编译：TableInfo / TypeInfo → CREATE 语句
//!
//! 生成格式：
//! ```text
//! CREATE TABLE [IF NOT EXISTS] <ks>.<name> (
//!     <field> <type>,
//!     ...
//!     PRIMARY KEY (...)
//! )
//! [WITH CLUSTERING ORDER BY (<col> ASC|DESC, ...)]
//! [WITH|AND COMPACT STORAGE]
//! [WITH|AND compression = {'sstable_compression': '<name>'}]
//! ;
//! ```
//!
//! 字段名、键名一律小写输出；keyspace / 表名 / 类型名原样输出。
//! 任一字段类型推断失败则整条语句作废，不返回半成品。

use crate::common::{CreateMode, Keys, Result, SchemaError};
use crate::field_type::Field;
use crate::meta::{Options, TableInfo, TypeInfo};
use crate::resolve::{resolve, TypeRegistry};

const INDENT: &str = "    ";

/// 目录查询，keyspace 名作为绑定参数
pub const TYPES_QUERY:  &str = "SELECT type_name FROM system_schema.types WHERE keyspace_name = ?";
pub const TABLES_QUERY: &str = "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?";

// ── CREATE TABLE ──────────────────────────────────────────────────────────────

pub fn compile_table(
    mode:     CreateMode,
    info:     &TableInfo,
    options:  &Options,
    registry: &TypeRegistry,
) -> Result<String> {
    validate_keys(info, options)?;

    let mut field_lines = field_lines(&info.fields, registry)?;
    field_lines.push(format!("{INDENT}{}", primary_key(&info.keys)));

    let mut lines = vec![
        format!("{} {}.{} (", mode.keyword("TABLE"), info.keyspace, info.name),
        field_lines.join(",\n"),
        ")".to_string(),
    ];

    // 第一个出现的子句用 WITH，其后用 AND
    let mut clauses: Vec<String> = Vec::new();
    if !options.clustering_order.is_empty() {
        let cols: Vec<String> = options.clustering_order.iter()
            .map(|o| format!("{} {}", o.column.to_lowercase(), o.direction))
            .collect();
        clauses.push(format!("CLUSTERING ORDER BY ({})", cols.join(", ")));
    }
    if options.compact_storage {
        clauses.push("COMPACT STORAGE".into());
    }
    if let Some(c) = options.compressor.as_deref().filter(|c| !c.is_empty()) {
        clauses.push(format!("compression = {{'sstable_compression': '{c}'}}"));
    }
    for (i, clause) in clauses.into_iter().enumerate() {
        let lead = if i == 0 { "WITH" } else { "AND" };
        lines.push(format!("{lead} {clause}"));
    }

    lines.push(";".into());
    let stmt = lines.join("\n");
    tracing::debug!(
        table = %info.name,
        fingerprint = fingerprint(&stmt),
        "compiled table statement"
    );
    Ok(stmt)
}

/// 主键子句：
/// - 有聚簇列        → `PRIMARY KEY ((p1, p2), c1, c2)`
/// - 无聚簇列 + 复合 → `PRIMARY KEY (p1, p2)`
/// - 无聚簇列        → `PRIMARY KEY ((p1, p2))`
pub fn primary_key(keys: &Keys) -> String {
    let pk = join_lower(&keys.partition_keys);
    if !keys.clustering_columns.is_empty() {
        format!("PRIMARY KEY (({pk}), {})", join_lower(&keys.clustering_columns))
    } else if keys.compound {
        format!("PRIMARY KEY ({pk})")
    } else {
        format!("PRIMARY KEY (({pk}))")
    }
}

fn validate_keys(info: &TableInfo, options: &Options) -> Result<()> {
    info.keys.validate()?;
    let keys = info.keys.partition_keys.iter().chain(&info.keys.clustering_columns);
    for k in keys {
        if !info.has_field(k) {
            return Err(SchemaError::InvalidKeys(format!(
                "key `{k}` is not a field of table {}", info.name
            )));
        }
    }
    for o in &options.clustering_order {
        if !info.keys.is_clustering_column(&o.column) {
            return Err(SchemaError::InvalidKeys(format!(
                "clustering order column `{}` is not a clustering column", o.column
            )));
        }
    }
    Ok(())
}

// ── CREATE TYPE ───────────────────────────────────────────────────────────────

/// UDT 字段可以引用已注册的其它 UDT（`frozen<...>`）
pub fn compile_type(
    mode:     CreateMode,
    info:     &TypeInfo,
    registry: &TypeRegistry,
) -> Result<String> {
    let lines = [
        format!("{} {}.{} (", mode.keyword("TYPE"), info.keyspace, info.name),
        field_lines(&info.fields, registry)?.join(",\n"),
        ")".to_string(),
        ";".to_string(),
    ];
    let stmt = lines.join("\n");
    tracing::debug!(
        udt = %info.name,
        fingerprint = fingerprint(&stmt),
        "compiled type statement"
    );
    Ok(stmt)
}

// ── DROP / KEYSPACE ───────────────────────────────────────────────────────────

pub fn drop_table(keyspace: &str, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {keyspace}.{table}")
}

pub fn drop_type(keyspace: &str, udt: &str) -> String {
    format!("DROP TYPE IF EXISTS {keyspace}.{udt}")
}

pub fn create_keyspace(mode: CreateMode, name: &str, replication: &str) -> String {
    format!("{} {name} WITH replication = {replication};", mode.keyword("KEYSPACE"))
}

pub fn drop_keyspace(name: &str) -> String {
    format!("DROP KEYSPACE IF EXISTS {name}")
}

// ── 辅助 ─────────────────────────────────────────────────────────────────────

/// 语句文本的 CRC32，用于在日志里关联不同进程发出的同一条 DDL
pub fn fingerprint(stmt: &str) -> u32 {
    crc32fast::hash(stmt.as_bytes())
}

fn field_lines(fields: &[Field], registry: &TypeRegistry) -> Result<Vec<String>> {
    fields.iter()
        .map(|f| {
            let ty = resolve(&f.shape, registry)?;
            Ok(format!("{INDENT}{} {ty}", f.name.to_lowercase()))
        })
        .collect()
}

fn join_lower(names: &[String]) -> String {
    names.iter().map(|n| n.to_lowercase()).collect::<Vec<_>>().join(", ")
}
