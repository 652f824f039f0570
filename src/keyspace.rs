//! Keyspace：UDT 注册表、表/类型工厂与 schema 目录操作
//!
//! ```text
//! register_type ──► TypeRegistry (形状 → UDT 名，进程内)
//!                        │ 编译时只读
//! table / map_table / … ─┴─► topology 推导 Keys + 表名
//!                               └─► TableFactory ─► Table ─► ddl ─► QueryExecutor
//! ```
//!
//! 注册表与存储端的 schema 目录互不同步：`exists_*` / `types` / `tables`
//! 只查执行器；`drop_type` 也不会清除注册表里的映射。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use parking_lot::{RwLock, RwLockReadGuard};
use crate::common::{Keys, Result, SchemaError};
use crate::ddl;
use crate::executor::{QueryExecutor, Value};
use crate::field_type::{ColumnShape, Field, Shape};
use crate::meta::{record_of, TableInfo, TypeInfo};
use crate::resolve::TypeRegistry;
use crate::partition::{Bucketer, TimeBucketer, BUCKET_FIELD};
use crate::table::{CqlTable, Table, TableFactory};
use crate::topology::{
    self, MapTable, MultiTimeSeriesTable, MultimapMkTable, MultimapTable, TimeSeriesTable,
};
use crate::udt::{CqlUserType, TypeFactory, UserType};

// ── 默认工厂 ──────────────────────────────────────────────────────────────────

/// 生成 [`CqlTable`] / [`CqlUserType`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl TableFactory for DefaultFactory {
    fn new_table(&self, keyspace: &KeySpace, info: TableInfo) -> Arc<dyn Table> {
        Arc::new(CqlTable::new(keyspace.clone(), info))
    }
}

impl TypeFactory for DefaultFactory {
    fn new_type(&self, keyspace: &KeySpace, info: TypeInfo) -> Arc<dyn UserType> {
        Arc::new(CqlUserType::new(keyspace.clone(), info))
    }
}

// ── KeySpace ──────────────────────────────────────────────────────────────────

struct KeySpaceInner {
    name:          String,
    executor:      Arc<dyn QueryExecutor>,
    /// 单写多读：注册时写锁，编译时读锁
    types:         RwLock<TypeRegistry>,
    debug_mode:    AtomicBool,
    table_factory: Arc<dyn TableFactory>,
    type_factory:  Arc<dyn TypeFactory>,
}

/// 绑定到一个 keyspace 名的句柄，clone 开销很小且共享同一注册表
#[derive(Clone)]
pub struct KeySpace(Arc<KeySpaceInner>);

impl KeySpace {
    pub fn new(name: &str, executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_factories(name, executor, Arc::new(DefaultFactory), Arc::new(DefaultFactory))
    }

    pub fn with_factories(
        name:          &str,
        executor:      Arc<dyn QueryExecutor>,
        table_factory: Arc<dyn TableFactory>,
        type_factory:  Arc<dyn TypeFactory>,
    ) -> Self {
        Self(Arc::new(KeySpaceInner {
            name: name.into(),
            executor,
            types: RwLock::new(TypeRegistry::new()),
            debug_mode: AtomicBool::new(false),
            table_factory,
            type_factory,
        }))
    }

    pub fn name(&self) -> &str { &self.0.name }

    /// 打开后执行的每条语句以 info 级别输出
    pub fn set_debug_mode(&self, on: bool) {
        self.0.debug_mode.store(on, Ordering::Relaxed);
    }

    pub fn debug_mode(&self) -> bool {
        self.0.debug_mode.load(Ordering::Relaxed)
    }

    /// 编译期间持有的只读视图
    pub(crate) fn registry(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.0.types.read()
    }

    /// 形状 id 对应的 UDT 名；不持有锁
    pub fn registered_type(&self, shape_id: &str) -> Option<String> {
        self.0.types.read().lookup(shape_id).map(str::to_string)
    }

    pub(crate) fn execute(&self, statement: &str) -> Result<()> {
        let fingerprint = ddl::fingerprint(statement);
        if self.debug_mode() {
            tracing::info!(keyspace = %self.name(), fingerprint, "{statement}");
        } else {
            tracing::debug!(keyspace = %self.name(), fingerprint, "{statement}");
        }
        self.0.executor.execute(statement).map_err(SchemaError::Catalog)
    }

    // ── UDT ───────────────────────────────────────────────────────────────────

    /// 登记 `T` 的形状 → `name`，此后本 keyspace 内出现 `T` 的字段都渲染为
    /// `frozen<name>`；同一形状再次登记会覆盖
    pub fn register_type<T: ColumnShape>(&self, name: &str) -> Result<Arc<dyn UserType>> {
        self.register_type_shape(name, &T::shape())
    }

    pub fn register_type_shape(&self, name: &str, entity: &Shape) -> Result<Arc<dyn UserType>> {
        let rec = record_of(entity)?;
        let previous = self.0.types.write().register(&rec.name, name);
        if let Some(old) = previous.filter(|old| old != name) {
            tracing::debug!(shape = %rec.name, old = %old, new = %name, "udt re-registered");
        }
        Ok(self.new_type(TypeInfo::new(self.name(), name, rec)))
    }

    pub fn new_type(&self, info: TypeInfo) -> Arc<dyn UserType> {
        self.0.type_factory.new_type(self, info)
    }

    // ── 表 ────────────────────────────────────────────────────────────────────

    pub fn new_table(&self, info: TableInfo) -> Arc<dyn Table> {
        self.0.table_factory.new_table(self, info)
    }

    /// 普通表，表名 `<name>__<分区键>__<聚簇列>`
    pub fn table<T: ColumnShape>(&self, name: &str, keys: Keys) -> Result<Arc<dyn Table>> {
        self.table_shape(name, &T::shape(), keys)
    }

    pub fn table_shape(&self, name: &str, row: &Shape, keys: Keys) -> Result<Arc<dyn Table>> {
        let rec = record_of(row)?;
        let scheme = topology::simple(name, keys);
        Ok(self.new_table(TableInfo::new(self.name(), &scheme.name, scheme.keys, rec)))
    }

    /// 以 `id` 为分区键的 KV 表
    pub fn map_table<T: ColumnShape>(&self, name: &str, id: &str) -> Result<MapTable> {
        let rec = record_of(&T::shape())?.clone();
        let scheme = topology::map(name, id);
        let table = self.new_table(TableInfo::new(self.name(), &scheme.name, scheme.keys, &rec));
        Ok(MapTable::new(table, id))
    }

    /// 按 `index_field` 分区、`id` 聚簇
    pub fn multimap_table<T: ColumnShape>(
        &self,
        name:        &str,
        index_field: &str,
        id:          &str,
    ) -> Result<MultimapTable> {
        let rec = record_of(&T::shape())?.clone();
        let scheme = topology::multimap(name, index_field, id);
        let table = self.new_table(TableInfo::new(self.name(), &scheme.name, scheme.keys, &rec));
        Ok(MultimapTable::new(table, index_field, id))
    }

    /// 多列分区 + 多列聚簇；表名不含键列，不同键组合须使用不同的 `name`
    pub fn multimap_multi_key_table<T: ColumnShape>(
        &self,
        name:          &str,
        index_fields:  &[&str],
        id_fields:     &[&str],
    ) -> Result<MultimapMkTable> {
        let rec = record_of(&T::shape())?.clone();
        let scheme = topology::multimap_multi_key(name, index_fields, id_fields);
        let table = self.new_table(TableInfo::new(self.name(), &scheme.name, scheme.keys, &rec));
        Ok(MultimapMkTable::new(table, index_fields, id_fields))
    }

    /// 按固定时长分桶的时间序列表
    pub fn time_series_table<T: ColumnShape>(
        &self,
        name:        &str,
        time_field:  &str,
        id_field:    &str,
        bucket_size: Duration,
    ) -> Result<TimeSeriesTable> {
        let rec = record_of(&T::shape())?.clone();
        let bucketer = TimeBucketer::new(bucket_size)?;
        let scheme = topology::time_series(name, time_field, id_field, &bucketer);
        let info = TableInfo::new(self.name(), &scheme.name, scheme.keys, &rec)
            .with_field(Field::new(BUCKET_FIELD, Shape::Timestamp));
        Ok(TimeSeriesTable::new(self.new_table(info), time_field, id_field, bucketer))
    }

    /// 单索引列 + 固定时长分桶
    pub fn multi_time_series_table<T: ColumnShape>(
        &self,
        name:        &str,
        index_field: &str,
        time_field:  &str,
        id_field:    &str,
        bucket_size: Duration,
    ) -> Result<MultiTimeSeriesTable> {
        let bucketer = Arc::new(TimeBucketer::new(bucket_size)?);
        self.flex_multi_time_series_table::<T>(name, time_field, id_field, &[index_field], bucketer)
    }

    /// 多索引列 + 任意分桶策略（如按日历月）
    pub fn flex_multi_time_series_table<T: ColumnShape>(
        &self,
        name:         &str,
        time_field:   &str,
        id_field:     &str,
        index_fields: &[&str],
        bucketer:     Arc<dyn Bucketer>,
    ) -> Result<MultiTimeSeriesTable> {
        let rec = record_of(&T::shape())?.clone();
        let scheme = topology::multi_time_series(
            name, index_fields, time_field, id_field, bucketer.as_ref(),
        );
        let info = TableInfo::new(self.name(), &scheme.name, scheme.keys, &rec)
            .with_field(Field::new(BUCKET_FIELD, Shape::Timestamp));
        Ok(MultiTimeSeriesTable::new(
            self.new_table(info), index_fields, time_field, id_field, bucketer,
        ))
    }

    // ── schema 目录 ───────────────────────────────────────────────────────────

    /// 存储端已存在的 UDT 名
    pub fn types(&self) -> Result<Vec<String>> {
        self.catalog_names(ddl::TYPES_QUERY, "type_name")
    }

    /// 存储端已存在的表名
    pub fn tables(&self) -> Result<Vec<String>> {
        self.catalog_names(ddl::TABLES_QUERY, "table_name")
    }

    pub fn exists_type(&self, udt: &str) -> Result<bool> {
        Ok(self.types()?.iter().any(|t| t.eq_ignore_ascii_case(udt)))
    }

    pub fn exists_table(&self, table: &str) -> Result<bool> {
        Ok(self.tables()?.iter().any(|t| t.eq_ignore_ascii_case(table)))
    }

    pub fn drop_type(&self, udt: &str) -> Result<()> {
        self.execute(&ddl::drop_type(self.name(), udt))
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.execute(&ddl::drop_table(self.name(), table))
    }

    fn catalog_names(&self, query: &str, column: &str) -> Result<Vec<String>> {
        let rows = self.0.executor
            .query(query, &[Value::Text(self.name().into())])
            .map_err(SchemaError::Catalog)?;
        rows.iter()
            .map(|row| match row.get(column) {
                Some(Value::Text(s)) => Ok(s.clone()),
                other => Err(SchemaError::UnexpectedCatalogValue {
                    column: column.into(),
                    value:  other.map_or_else(|| "<missing>".into(), ToString::to_string),
                }),
            })
            .collect()
    }
}

impl std::fmt::Debug for KeySpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySpace")
            .field("name", &self.0.name)
            .field("registered_types", &self.0.types.read().len())
            .finish()
    }
}
