//! # cql-schema 完整使用案例
//!
//! 用进程内的 MemoryExecutor 走一遍全部核心功能：
//!
//! 1. 创建 keyspace
//! 2. 登记并创建 UDT
//! 3. 普通表（带 clustering order 与压缩选项）
//! 4. map / multimap 拓扑
//! 5. 时间序列：固定时长分桶与日历分桶
//! 6. schema 目录查询与 recreate

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use cql_schema::{
    common::{ClusteringOrderColumn, Keys},
    connection::Connection,
    executor::MemoryExecutor,
    meta::Options,
    partition::CalendarBucketer,
    record_shape,
    table::Table,
    udt::UserType,
};

struct Address { street: String, city: String, zip: u32 }
record_shape!(Address { street: String, city: String, zip: u32 });

struct Customer {
    id:        Uuid,
    email:     String,
    name:      String,
    addresses: Vec<Address>,
    tags:      HashMap<String, String>,
}
record_shape!(Customer {
    id: Uuid, email: String, name: String,
    addresses: Vec<Address>, tags: HashMap<String, String>,
});

struct Trip {
    id:       Uuid,
    city:     String,
    driver:   String,
    started:  DateTime<Utc>,
    distance: f64,
    route:    Vec<u8>,
}
record_shape!(Trip {
    id: Uuid, city: String, driver: String,
    started: DateTime<Utc>, distance: f64, route: Vec<u8>,
});

fn main() -> cql_schema::common::Result<()> {
    println!("═══════════════════════════════════════════════════════════");
    println!("   cql-schema 演示                                          ");
    println!("═══════════════════════════════════════════════════════════\n");

    let executor = Arc::new(MemoryExecutor::new());
    let conn = Connection::new(executor.clone());

    // =========================================================================
    // 1. keyspace
    // =========================================================================
    println!("【1】创建 keyspace `rides` ...");
    let ks = conn.create_keyspace_if_not_exist("rides", None)?;
    ks.set_debug_mode(true);
    println!("    {}\n", executor.last_statement().unwrap_or_default());

    // =========================================================================
    // 2. UDT
    // =========================================================================
    println!("【2】登记 UDT `address` ...");
    let address = ks.register_type::<Address>("address")?;
    address.create_if_not_exist()?;
    println!("{}\n", address.create_if_not_exist_statement()?);

    // =========================================================================
    // 3. 普通表
    // =========================================================================
    println!("【3】普通表 customers ...");
    let customers = ks
        .table::<Customer>("customers", Keys::new(["email"], ["id"]))?
        .with_options(
            Options::default()
                .with_clustering_order(vec![ClusteringOrderColumn::desc("id")])
                .with_compressor("LZ4Compressor"),
        );
    customers.create()?;
    println!("{}\n", customers.create_statement()?);

    // =========================================================================
    // 4. map / multimap
    // =========================================================================
    println!("【4】map / multimap 拓扑 ...");
    let by_id = ks.map_table::<Customer>("customers", "id")?;
    let by_city = ks.multimap_table::<Trip>("trips", "city", "id")?;
    by_id.create_if_not_exist()?;
    by_city.create_if_not_exist()?;
    println!("    {}  (partition = {})", by_id.name(), by_id.id_field());
    println!("    {}  (partition = {}, clustering = {})\n",
        by_city.name(), by_city.index_field(), by_city.id_field());

    // =========================================================================
    // 5. 时间序列
    // =========================================================================
    println!("【5】时间序列 ...");
    let hourly = ks.time_series_table::<Trip>("trips", "started", "id", Duration::from_secs(3600))?;
    hourly.create_if_not_exist()?;
    println!("{}", hourly.create_statement()?);

    let monthly = ks.flex_multi_time_series_table::<Trip>(
        "trips", "started", "id", &["city", "driver"], Arc::new(CalendarBucketer::Month),
    )?;
    monthly.create_if_not_exist()?;
    println!("    {}", monthly.name());

    let ts = Utc.with_ymd_and_hms(2024, 2, 29, 18, 30, 0).single().unwrap_or_default();
    println!("    {ts} → hourly bucket {}", hourly.bucket_for(ts));
    println!("    {ts} → monthly bucket {}", monthly.bucket_for(ts));
    let start = Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).single().unwrap_or_default();
    for b in monthly.buckets_between(start, ts) {
        println!("      scan partition bucket = {b}");
    }
    println!();

    // =========================================================================
    // 6. 目录与 recreate
    // =========================================================================
    println!("【6】schema 目录 ...");
    for t in ks.tables()? {
        println!("    table {t}");
    }
    for t in ks.types()? {
        println!("    type  {t}");
    }
    by_id.recreate()?;
    println!("    recreate {} ✓", by_id.name());
    println!("    共执行 {} 条语句", executor.statements().len());

    conn.close();
    println!("\n✓ 完成");
    Ok(())
}
