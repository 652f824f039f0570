//! 连接：keyspace 生命周期
//!
//! 不负责拨号；调用方把已连好的执行器交进来，这里只生成并下发
//! keyspace 级别的 DDL，再把同一个执行器交给每个 [`KeySpace`]。

use std::sync::Arc;
use crate::common::{CreateMode, Result, SchemaError};
use crate::ddl;
use crate::executor::QueryExecutor;
use crate::keyspace::KeySpace;

pub struct Connection {
    executor: Arc<dyn QueryExecutor>,
}

impl Connection {
    /// 单副本 SimpleStrategy，适合开发环境
    pub const DEFAULT_REPLICATION: &'static str =
        "{'class': 'SimpleStrategy', 'replication_factor': 1 }";

    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// `replication` 为 None 时使用 [`Self::DEFAULT_REPLICATION`]
    pub fn create_keyspace(&self, name: &str, replication: Option<&str>) -> Result<()> {
        self.run(&ddl::create_keyspace(
            CreateMode::Create,
            name,
            replication.unwrap_or(Self::DEFAULT_REPLICATION),
        ))
    }

    pub fn create_keyspace_if_not_exist(&self, name: &str, replication: Option<&str>) -> Result<KeySpace> {
        self.run(&ddl::create_keyspace(
            CreateMode::IfNotExists,
            name,
            replication.unwrap_or(Self::DEFAULT_REPLICATION),
        ))?;
        Ok(self.keyspace(name))
    }

    pub fn drop_keyspace(&self, name: &str) -> Result<()> {
        tracing::warn!(keyspace = %name, "dropping keyspace");
        self.run(&ddl::drop_keyspace(name))
    }

    /// 不检查 keyspace 是否已存在
    pub fn keyspace(&self, name: &str) -> KeySpace {
        KeySpace::new(name, self.executor.clone())
    }

    pub fn close(&self) {
        self.executor.close();
    }

    fn run(&self, statement: &str) -> Result<()> {
        tracing::debug!(fingerprint = ddl::fingerprint(statement), "{statement}");
        self.executor.execute(statement).map_err(SchemaError::Catalog)
    }
}
