//! 存储过程迁移辅助方法
//!
//! 在迁移中按 `(存储过程, 版本)` 加载嵌入的 SQL 文件并执行，或删除存储过程

use crate::stored_procedures::StoredProcedure;
use sea_orm_migration::prelude::*;
use tracing::{error, info};

#[async_trait::async_trait]
pub trait StoredProcedureMigrationExt {
    /// Create, or replace, a stored procedure from the given version's resource
    async fn create_stored_procedure(
        &self,
        procedure: StoredProcedure,
        version: u32,
    ) -> Result<(), DbErr>;

    /// Drop a stored procedure
    async fn drop_stored_procedure(&self, procedure: StoredProcedure) -> Result<(), DbErr>;
}

#[async_trait::async_trait]
impl StoredProcedureMigrationExt for SchemaManager<'_> {
    async fn create_stored_procedure(
        &self,
        procedure: StoredProcedure,
        version: u32,
    ) -> Result<(), DbErr> {
        let resource = procedure.version(version);
        let sql = resource.load().map_err(|e| {
            error!("Cannot apply {} version {}: {}", procedure, version, e);
            DbErr::from(e)
        })?;

        info!(
            "Creating stored procedure {} from {}",
            procedure,
            resource.resource_name()
        );
        self.get_connection().execute_unprepared(&sql).await?;

        Ok(())
    }

    async fn drop_stored_procedure(&self, procedure: StoredProcedure) -> Result<(), DbErr> {
        info!("Dropping stored procedure {}", procedure);
        self.get_connection()
            .execute_unprepared(&drop_statement(procedure))
            .await?;

        Ok(())
    }
}

fn drop_statement(procedure: StoredProcedure) -> String {
    format!("DROP {} {}", procedure.kind().keyword(), procedure)
}
