use super::procedures::StoredProcedureMigrationExt;
use crate::stored_procedures::StoredProcedure;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建两个存储过程的第一个版本
        manager
            .create_stored_procedure(StoredProcedure::DeleteItems, 1)
            .await?;
        manager
            .create_stored_procedure(StoredProcedure::GetItems, 1)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_stored_procedure(StoredProcedure::DeleteItems)
            .await?;
        manager
            .drop_stored_procedure(StoredProcedure::GetItems)
            .await?;

        Ok(())
    }
}
