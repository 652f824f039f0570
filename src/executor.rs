//! 语句执行器边界
//!
//! 本 crate 只生成语句，真正连集群、执行语句的是外部实现的
//! [`QueryExecutor`]。[`MemoryExecutor`] 是进程内实现：记录全部语句并
//! 维护一份极简 schema 目录，供 dry-run 与测试使用。

use std::collections::{BTreeSet, HashMap};
use parking_lot::Mutex;
use crate::common::BoxError;
use crate::ddl::{TABLES_QUERY, TYPES_QUERY};

// ── 行与值 ────────────────────────────────────────────────────────────────────

/// 查询参数 / 结果中的单个值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Uuid(uuid::Uuid),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self { Self::Text(s) => Some(s), _ => None }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::Text(s.into()) }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null         => write!(f, "NULL"),
            Self::Bool(v)      => write!(f, "{v}"),
            Self::Int(v)       => write!(f, "{v}"),
            Self::Double(v)    => write!(f, "{v}"),
            Self::Text(s)      => write!(f, "'{s}'"),
            Self::Bytes(b)     => write!(f, "<{} bytes>", b.len()),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Uuid(u)      => write!(f, "{u}"),
        }
    }
}

/// 一行结果：列名 → 值
pub type Row = HashMap<String, Value>;

// ── 执行器 ────────────────────────────────────────────────────────────────────

pub trait QueryExecutor: Send + Sync {
    /// 执行 DDL
    fn execute(&self, statement: &str) -> Result<(), BoxError>;
    /// 执行查询（目录查询用），`args` 绑定到 `?` 占位符
    fn query(&self, statement: &str, args: &[Value]) -> Result<Vec<Row>, BoxError>;
    fn close(&self);
}

// ── MemoryExecutor ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Catalog {
    keyspaces: BTreeSet<String>,
    /// (keyspace, name)
    tables:    BTreeSet<(String, String)>,
    types:     BTreeSet<(String, String)>,
}

#[derive(Default)]
struct MemoryState {
    statements: Vec<String>,
    catalog:    Catalog,
    failure:    Option<String>,
    closed:     bool,
}

/// 进程内执行器
///
/// 只识别 `CREATE|DROP TABLE|TYPE|KEYSPACE` 与两条固定的目录查询，
/// 其余语句只记录不解释。
#[derive(Default)]
pub struct MemoryExecutor {
    state: Mutex<MemoryState>,
}

impl MemoryExecutor {
    pub fn new() -> Self { Self::default() }

    /// 已执行的语句（按顺序）
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().statements.clone()
    }

    pub fn last_statement(&self) -> Option<String> {
        self.state.lock().statements.last().cloned()
    }

    /// 之后的每次调用都返回该错误；传 None 恢复
    pub fn fail_with(&self, message: Option<&str>) {
        self.state.lock().failure = message.map(Into::into);
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn has_table(&self, keyspace: &str, table: &str) -> bool {
        self.state.lock().catalog.tables.contains(&(keyspace.into(), table.to_lowercase()))
    }

    pub fn has_type(&self, keyspace: &str, udt: &str) -> bool {
        self.state.lock().catalog.types.contains(&(keyspace.into(), udt.to_lowercase()))
    }

    pub fn has_keyspace(&self, keyspace: &str) -> bool {
        self.state.lock().catalog.keyspaces.contains(keyspace)
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(&self, statement: &str) -> Result<(), BoxError> {
        let mut st = self.state.lock();
        if let Some(msg) = &st.failure {
            return Err(msg.clone().into());
        }
        apply(&mut st.catalog, statement)?;
        st.statements.push(statement.into());
        Ok(())
    }

    fn query(&self, statement: &str, args: &[Value]) -> Result<Vec<Row>, BoxError> {
        let st = self.state.lock();
        if let Some(msg) = &st.failure {
            return Err(msg.clone().into());
        }
        let keyspace = args.first()
            .and_then(Value::as_str)
            .ok_or("catalog query expects a keyspace name argument")?;
        let (set, column) = match statement {
            TYPES_QUERY  => (&st.catalog.types, "type_name"),
            TABLES_QUERY => (&st.catalog.tables, "table_name"),
            other        => return Err(format!("unsupported query: {other}").into()),
        };
        Ok(set.iter()
            .filter(|(ks, _)| ks == keyspace)
            .map(|(_, name)| Row::from([(column.to_string(), Value::Text(name.clone()))]))
            .collect())
    }

    fn close(&self) {
        self.state.lock().closed = true;
    }
}

/// 按首行的前几个词更新目录；存储层对名字大小写不敏感，统一小写保存
fn apply(catalog: &mut Catalog, statement: &str) -> Result<(), BoxError> {
    let head: Vec<&str> = statement
        .lines()
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .filter(|w| !matches!(*w, "IF" | "NOT" | "EXISTS" | "("))
        .collect();

    match head.as_slice() {
        ["CREATE", "KEYSPACE", name, ..] => {
            if !catalog.keyspaces.insert(name.to_string()) && !statement.contains("IF NOT EXISTS") {
                return Err(format!("keyspace {name} already exists").into());
            }
        }
        ["DROP", "KEYSPACE", name, ..] => {
            catalog.keyspaces.remove(*name);
            catalog.tables.retain(|(ks, _)| ks != name);
            catalog.types.retain(|(ks, _)| ks != name);
        }
        ["CREATE", kind @ ("TABLE" | "TYPE"), qualified, ..] => {
            let key = split_qualified(qualified)?;
            let set = if *kind == "TABLE" { &mut catalog.tables } else { &mut catalog.types };
            if !set.insert(key) && !statement.contains("IF NOT EXISTS") {
                return Err(format!("{} {qualified} already exists", kind.to_lowercase()).into());
            }
        }
        ["DROP", kind @ ("TABLE" | "TYPE"), qualified, ..] => {
            let key = split_qualified(qualified)?;
            let set = if *kind == "TABLE" { &mut catalog.tables } else { &mut catalog.types };
            set.remove(&key);
        }
        _ => {}
    }
    Ok(())
}

fn split_qualified(qualified: &str) -> Result<(String, String), BoxError> {
    let (ks, name) = qualified
        .split_once('.')
        .ok_or_else(|| format!("expected <keyspace>.<name>, got {qualified}"))?;
    Ok((ks.to_string(), name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_tables_and_types() {
        let ex = MemoryExecutor::new();
        ex.execute("CREATE TABLE ks.Users (\n    id varchar,\n    PRIMARY KEY ((id))\n)\n;").unwrap();
        ex.execute("CREATE TYPE IF NOT EXISTS ks.tag (\n    key varchar\n)\n;").unwrap();
        assert!(ex.has_table("ks", "users"));
        assert!(ex.has_type("ks", "tag"));

        let rows = ex.query(TABLES_QUERY, &[Value::from("ks")]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["table_name"].as_str(), Some("users"));
        assert!(ex.query(TYPES_QUERY, &[Value::from("other")]).unwrap().is_empty());

        ex.execute("DROP TABLE IF EXISTS ks.users").unwrap();
        assert!(!ex.has_table("ks", "users"));
        assert_eq!(ex.statements().len(), 3);
    }

    #[test]
    fn duplicate_create_fails_unless_idempotent() {
        let ex = MemoryExecutor::new();
        ex.execute("CREATE TABLE ks.t (\n)\n;").unwrap();
        assert!(ex.execute("CREATE TABLE ks.t (\n)\n;").is_err());
        assert_eq!(ex.statements().len(), 1);
        assert!(ex.execute("CREATE TABLE IF NOT EXISTS ks.t (\n)\n;").is_ok());
        assert_eq!(ex.statements().len(), 2);
    }

    #[test]
    fn armed_failure_and_close() {
        let ex = MemoryExecutor::new();
        ex.fail_with(Some("node down"));
        let err = ex.execute("DROP TABLE IF EXISTS ks.t").unwrap_err();
        assert_eq!(err.to_string(), "node down");
        assert!(ex.statements().is_empty());
        ex.fail_with(None);
        ex.close();
        assert!(ex.is_closed());
    }

    #[test]
    fn keyspace_lifecycle() {
        let ex = MemoryExecutor::new();
        ex.execute("CREATE KEYSPACE IF NOT EXISTS ks WITH replication = {};").unwrap();
        ex.execute("CREATE TABLE ks.t (\n)\n;").unwrap();
        assert!(ex.has_keyspace("ks"));
        ex.execute("DROP KEYSPACE IF EXISTS ks").unwrap();
        assert!(!ex.has_keyspace("ks"));
        assert!(!ex.has_table("ks", "t"));
    }
}
