use super::procedures::StoredProcedureMigrationExt;
use crate::stored_procedures::StoredProcedure;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 升级 get_items 到版本 2
        manager
            .create_stored_procedure(StoredProcedure::GetItems, 2)
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 回退到版本 1：重新执行版本 1 的 SQL 文件
        manager
            .create_stored_procedure(StoredProcedure::GetItems, 1)
            .await
    }
}
