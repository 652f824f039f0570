//! 表句柄与表工厂

use std::sync::Arc;
use crate::common::{CreateMode, Result};
use crate::ddl;
use crate::keyspace::KeySpace;
use crate::meta::{Options, TableInfo};

// ── Table ─────────────────────────────────────────────────────────────────────

pub trait Table: Send + Sync {
    fn info(&self) -> &TableInfo;
    fn options(&self) -> &Options;

    fn name(&self) -> &str { &self.info().name }

    /// 返回合并了 `options` 的新句柄，自身不变
    fn with_options(&self, options: Options) -> Arc<dyn Table>;

    fn create_statement(&self) -> Result<String>;
    fn create_if_not_exist_statement(&self) -> Result<String>;

    fn create(&self) -> Result<()>;
    fn create_if_not_exist(&self) -> Result<()>;
    /// 存在则先删除，再创建
    fn recreate(&self) -> Result<()>;
}

/// 默认实现：编译 DDL 并交给 keyspace 的执行器
pub struct CqlTable {
    keyspace: KeySpace,
    info:     TableInfo,
    options:  Options,
}

impl CqlTable {
    pub fn new(keyspace: KeySpace, info: TableInfo) -> Self {
        Self { keyspace, info, options: Options::default() }
    }

    fn statement(&self, mode: CreateMode) -> Result<String> {
        let registry = self.keyspace.registry();
        ddl::compile_table(mode, &self.info, &self.options, &registry)
    }
}

impl Table for CqlTable {
    fn info(&self) -> &TableInfo { &self.info }
    fn options(&self) -> &Options { &self.options }

    fn with_options(&self, options: Options) -> Arc<dyn Table> {
        Arc::new(Self {
            keyspace: self.keyspace.clone(),
            info:     self.info.clone(),
            options:  self.options.merge(&options),
        })
    }

    fn create_statement(&self) -> Result<String> {
        self.statement(CreateMode::Create)
    }

    fn create_if_not_exist_statement(&self) -> Result<String> {
        self.statement(CreateMode::IfNotExists)
    }

    fn create(&self) -> Result<()> {
        let stmt = self.create_statement()?;
        self.keyspace.execute(&stmt)
    }

    fn create_if_not_exist(&self) -> Result<()> {
        let stmt = self.create_if_not_exist_statement()?;
        self.keyspace.execute(&stmt)
    }

    fn recreate(&self) -> Result<()> {
        // 先编译：语句非法时不应删除现有表
        let stmt = self.create_statement()?;
        if self.keyspace.exists_table(self.name())? {
            tracing::warn!(keyspace = %self.keyspace.name(), table = %self.name(), "dropping table for recreate");
            self.keyspace.drop_table(self.name())?;
        }
        self.keyspace.execute(&stmt)
    }
}

// ── 工厂 ──────────────────────────────────────────────────────────────────────

/// keyspace 通过它创建表句柄；测试可注入替身
pub trait TableFactory: Send + Sync {
    fn new_table(&self, keyspace: &KeySpace, info: TableInfo) -> Arc<dyn Table>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ClusteringOrderColumn, Keys, SchemaError};
    use crate::executor::MemoryExecutor;

    struct Post { author: String, id: i64, body: String }
    crate::record_shape!(Post { author: String, id: i64, body: String });

    fn setup() -> (Arc<MemoryExecutor>, KeySpace) {
        let ex = Arc::new(MemoryExecutor::new());
        let ks = KeySpace::new("blog", ex.clone());
        (ex, ks)
    }

    #[test]
    fn create_executes_compiled_statement() {
        let (ex, ks) = setup();
        let t = ks.table::<Post>("posts", Keys::new(["author"], ["id"])).unwrap();
        assert_eq!(t.name(), "posts__author__id");
        t.create().unwrap();
        assert_eq!(ex.last_statement(), Some(t.create_statement().unwrap()));
        assert!(ex.has_table("blog", "posts__author__id"));
        assert!(t.create().is_err());
        t.create_if_not_exist().unwrap();
    }

    #[test]
    fn with_options_returns_new_handle() {
        let (_ex, ks) = setup();
        let t = ks.table::<Post>("posts", Keys::new(["author"], ["id"])).unwrap();
        let ordered = t.with_options(
            Options::default().with_clustering_order(vec![ClusteringOrderColumn::desc("id")]),
        );
        assert!(t.options().clustering_order.is_empty());
        assert!(ordered.create_statement().unwrap().contains("WITH CLUSTERING ORDER BY (id DESC)"));
        assert_eq!(ordered.name(), t.name());
    }

    #[test]
    fn recreate_drops_existing_table() {
        let (ex, ks) = setup();
        let t = ks.table::<Post>("posts", Keys::new(["author"], ["id"])).unwrap();
        t.create().unwrap();
        t.recreate().unwrap();
        let stmts = ex.statements();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[1], "DROP TABLE IF EXISTS blog.posts__author__id");
        assert!(ex.has_table("blog", "posts__author__id"));
    }

    #[test]
    fn executor_errors_surface_as_catalog_errors() {
        let (ex, ks) = setup();
        let t = ks.table::<Post>("posts", Keys::partition(["id"])).unwrap();
        ex.fail_with(Some("unavailable"));
        match t.create() {
            Err(SchemaError::Catalog(e)) => assert_eq!(e.to_string(), "unavailable"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(t.recreate(), Err(SchemaError::Catalog(_))));
    }

    #[test]
    fn compile_failure_never_reaches_executor() {
        let (ex, ks) = setup();
        let t = ks.table::<Post>("posts", Keys::partition(["missing"])).unwrap();
        assert!(matches!(t.create(), Err(SchemaError::InvalidKeys(_))));
        assert!(matches!(t.recreate(), Err(SchemaError::InvalidKeys(_))));
        assert!(ex.statements().is_empty());
    }
}
