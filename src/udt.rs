//! UDT（用户自定义类型）句柄与类型工厂

use std::sync::Arc;
use crate::common::{CreateMode, Result};
use crate::ddl;
use crate::keyspace::KeySpace;
use crate::meta::TypeInfo;

pub trait UserType: Send + Sync {
    fn info(&self) -> &TypeInfo;

    fn name(&self) -> &str { &self.info().name }

    fn create_statement(&self) -> Result<String>;
    fn create_if_not_exist_statement(&self) -> Result<String>;

    fn create(&self) -> Result<()>;
    fn create_if_not_exist(&self) -> Result<()>;
    /// 存在则先删除，再创建
    fn recreate(&self) -> Result<()>;
}

pub struct CqlUserType {
    keyspace: KeySpace,
    info:     TypeInfo,
}

impl CqlUserType {
    pub fn new(keyspace: KeySpace, info: TypeInfo) -> Self {
        Self { keyspace, info }
    }

    fn statement(&self, mode: CreateMode) -> Result<String> {
        let registry = self.keyspace.registry();
        ddl::compile_type(mode, &self.info, &registry)
    }
}

impl UserType for CqlUserType {
    fn info(&self) -> &TypeInfo { &self.info }

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
        let stmt = self.create_statement()?;
        if self.keyspace.exists_type(self.name())? {
            tracing::warn!(keyspace = %self.keyspace.name(), udt = %self.name(), "dropping type for recreate");
            self.keyspace.drop_type(self.name())?;
        }
        self.keyspace.execute(&stmt)
    }
}

pub trait TypeFactory: Send + Sync {
    fn new_type(&self, keyspace: &KeySpace, info: TypeInfo) -> Arc<dyn UserType>;
}
