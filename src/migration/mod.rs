//! SeaORM 数据库迁移模块
//!
//! 使用 SeaORM Migration 管理表结构与存储过程版本。
//! 迁移名称以时间戳开头，按时间顺序依次执行。

use sea_orm_migration::prelude::*;

mod m20220529_105500_create_items_table;
mod m20220529_105558_create_stored_procedures;
mod m20220529_105617_update_stored_procedures;
pub mod procedures;

pub use procedures::StoredProcedureMigrationExt;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220529_105500_create_items_table::Migration),
            Box::new(m20220529_105558_create_stored_procedures::Migration),
            Box::new(m20220529_105617_update_stored_procedures::Migration),
        ]
    }
}
