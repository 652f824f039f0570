//! # cql-schema
//!
//! Cassandra/CQL 的 schema 层：从 Rust 值的形状推断列类型，编译
//! `CREATE TABLE` / `CREATE TYPE` 语句，并按常见访问模式（map、multimap、
//! 时间序列）推导主键与表名。连集群、执行语句交给外部的 [`executor::QueryExecutor`]。
//!
//! ## 整体架构
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Connection                            │
//! │          create / drop keyspace ─► KeySpace (每个名字一个)     │
//! │   ┌──────────────────────────────────────────────────────┐   │
//! │   │ KeySpace                                              │   │
//! │   │   TypeRegistry (RwLock)   形状 id → UDT 名            │   │
//! │   │   TableFactory / TypeFactory (可注入)                 │   │
//! │   │        │                                              │   │
//! │   │   topology ── Keys + 表名                             │   │
//! │   │     ├─ simple / map / multimap / multimapMk           │   │
//! │   │     └─ timeSeries / multiTimeSeries ── Bucketer       │   │
//! │   │        │                                              │   │
//! │   │   Table / UserType 句柄                               │   │
//! │   │        │                                              │   │
//! │   │   ddl ── resolve(Shape) ─► "list<frozen<tag>>" …      │   │
//! │   └────────┼─────────────────────────────────────────────┘   │
//! │            ▼                                                  │
//! │      QueryExecutor  (外部实现 / MemoryExecutor)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

// ── 值形状与类型推断 ──────────────────────────────────────────────────────────
pub mod common;
pub mod field_type;
pub mod resolve;
pub mod meta;

// ── DDL 与执行边界 ────────────────────────────────────────────────────────────
pub mod ddl;
pub mod executor;

// ── 句柄与拓扑 ────────────────────────────────────────────────────────────────
pub mod partition;
pub mod table;
pub mod udt;
pub mod topology;
pub mod keyspace;
pub mod connection;
