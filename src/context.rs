//! 数据库上下文
//!
//! 持有 SeaORM 连接，负责执行迁移，并把业务操作转换为存储过程调用

use crate::config::StorageConfig;
use crate::entities::{item, prelude::*};
use crate::error::Result;
use crate::executor::{self, ProcedureParam};
use crate::migration::Migrator;
use crate::stored_procedures::StoredProcedure;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait,
    QueryOrder, SelectModel, SelectorRaw, Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Applied / pending state of one migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub name: String,
    pub applied: bool,
}

/// SeaORM 上下文
#[derive(Debug)]
pub struct Context {
    db: DatabaseConnection,
}

impl Context {
    /// Wrap an existing connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 按配置连接数据库
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let options = config.connect_options()?;
        info!("Connecting to database");

        let db = Database::connect(options).await?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // ============================================================================
    // 迁移
    // ============================================================================

    /// Apply pending migrations, all of them when `steps` is `None`
    pub async fn migrate_up(&self, steps: Option<u32>) -> Result<()> {
        Migrator::up(&self.db, steps).await?;
        info!("Migrations applied");
        Ok(())
    }

    /// Roll back applied migrations, all of them when `steps` is `None`
    pub async fn migrate_down(&self, steps: Option<u32>) -> Result<()> {
        Migrator::down(&self.db, steps).await?;
        info!("Migrations rolled back");
        Ok(())
    }

    /// Every known migration with its state, oldest first
    pub async fn migration_status(&self) -> Result<Vec<MigrationState>> {
        let applied: Vec<String> = Migrator::get_applied_migrations(&self.db)
            .await?
            .iter()
            .map(|migration| migration.name().to_string())
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|migration| {
                let name = migration.name().to_string();
                MigrationState {
                    applied: applied.contains(&name),
                    name,
                }
            })
            .collect())
    }

    // ============================================================================
    // 实体操作
    // ============================================================================

    /// 新增 item
    pub async fn add_item(&self, label: &str) -> Result<item::Model> {
        let model = item::ActiveModel::with_label(label).insert(&self.db).await?;
        info!("Added item {} ({})", model.id, model.label);
        Ok(model)
    }

    /// 获取所有 item
    pub async fn list_items(&self) -> Result<Vec<item::Model>> {
        Ok(Item::find()
            .order_by_asc(ItemColumn::Id)
            .all(&self.db)
            .await?)
    }

    /// Remove every item through the entity API, returns the number removed
    pub async fn clear_items(&self) -> Result<u64> {
        let result = Item::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    // ============================================================================
    // 存储过程
    // ============================================================================

    /// 删除全部 item（调用 delete_items 存储过程）
    pub async fn delete_items(&self) -> Result<()> {
        executor::execute_stored_procedure(&self.db, StoredProcedure::DeleteItems, &[]).await?;
        Ok(())
    }

    /// 按 label 查询 item（调用 get_items 存储函数）
    ///
    /// 返回惰性查询，执行前不会访问数据库
    pub fn get_items(&self, label: &str) -> Result<SelectorRaw<SelectModel<item::Model>>> {
        let params = [ProcedureParam::new("label", label)];
        executor::query_stored_procedure::<Item>(
            self.db.get_database_backend(),
            StoredProcedure::GetItems,
            &params,
        )
    }

    /// [`Context::get_items`], executed
    pub async fn fetch_items(&self, label: &str) -> Result<Vec<item::Model>> {
        Ok(self.get_items(label)?.all(&self.db).await?)
    }

    /// Body of an installed routine, `None` when it is not installed
    pub async fn routine_source(&self, procedure: StoredProcedure) -> Result<Option<String>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT p.prosrc
               FROM pg_proc p
               JOIN pg_namespace n ON n.oid = p.pronamespace
               WHERE p.proname = $1 AND n.nspname = current_schema()"#,
            [procedure.name().into()],
        );

        match self.db.query_one(statement).await? {
            Some(row) => Ok(Some(row.try_get::<String>("", "prosrc")?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction, Value};
    use std::collections::BTreeMap;

    fn item(id: i32, label: &str) -> item::Model {
        item::Model {
            id,
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn test_delete_items_calls_procedure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let context = Context::new(db);

        context.delete_items().await.unwrap();

        assert_eq!(
            context.db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "CALL delete_items()",
                []
            )]
        );
    }

    #[tokio::test]
    async fn test_fetch_items_by_label() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item(2, "item 2"), item(3, "item 2")]])
            .into_connection();
        let context = Context::new(db);

        let items = context.fetch_items("item 2").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items.iter().map(|i| i.label.as_str()).collect::<Vec<_>>(),
            vec!["item 2", "item 2"]
        );

        assert_eq!(
            context.db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT * FROM get_items(label => $1)",
                ["item 2".into()]
            )]
        );
    }

    #[tokio::test]
    async fn test_add_and_list_items() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item(1, "item 1")]])
            .append_query_results([vec![item(1, "item 1")]])
            .into_connection();
        let context = Context::new(db);

        let added = context.add_item("item 1").await.unwrap();
        assert_eq!(added, item(1, "item 1"));

        let items = context.list_items().await.unwrap();
        assert_eq!(items, vec![item(1, "item 1")]);
    }

    #[tokio::test]
    async fn test_routine_source() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([(
                "prosrc",
                Value::from("DELETE FROM items;"),
            )])]])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let context = Context::new(db);

        let source = context
            .routine_source(StoredProcedure::DeleteItems)
            .await
            .unwrap();
        assert_eq!(source.as_deref(), Some("DELETE FROM items;"));

        let missing = context
            .routine_source(StoredProcedure::GetItems)
            .await
            .unwrap();
        assert_eq!(missing, None);
    }
}
