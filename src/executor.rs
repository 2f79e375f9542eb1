//! 存储过程执行器
//!
//! 根据存储过程与命名参数生成调用语句并执行：
//! - 过程（PROCEDURE）：`CALL name(p => $1)`，不返回结果
//! - 返回结果集的函数（FUNCTION）：`SELECT * FROM name(p => $1)`，映射为实体模型
//!
//! 服务器端的错误（过程不存在、参数不匹配等）原样向上传递，不做重试。

use crate::error::{ProcError, Result};
use crate::stored_procedures::{RoutineKind, StoredProcedure};
use regex::Regex;
use sea_orm::{
    ConnectionTrait, DbBackend, EntityTrait, ExecResult, SelectModel, SelectorRaw, Statement,
    Value,
};
use std::sync::LazyLock;
use tracing::debug;

static PARAMETER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("parameter name pattern is valid")
});

/// A named argument passed to a stored procedure
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureParam {
    pub name: String,
    pub value: Value,
}

impl ProcedureParam {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 生成存储过程调用语句（仅支持 PostgreSQL）
///
/// 参数使用命名形式 `name => $n`，参数名会被直接拼接进 SQL，因此必须是普通标识符
pub fn invocation_sql(
    backend: DbBackend,
    procedure: StoredProcedure,
    params: &[ProcedureParam],
) -> Result<String> {
    if backend != DbBackend::Postgres {
        return Err(ProcError::UnsupportedBackend(backend));
    }

    let arguments = params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            if !PARAMETER_NAME.is_match(&param.name) {
                return Err(ProcError::InvalidParameter(format!(
                    "'{}' is not a valid parameter name for {}",
                    param.name, procedure
                )));
            }
            Ok(format!("{} => ${}", param.name, index + 1))
        })
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let sql = match procedure.kind() {
        RoutineKind::Procedure => format!("CALL {}({})", procedure, arguments),
        RoutineKind::Function => format!("SELECT * FROM {}({})", procedure, arguments),
    };

    Ok(sql)
}

/// Invocation statement with the parameter values bound in order
pub fn invocation_statement(
    backend: DbBackend,
    procedure: StoredProcedure,
    params: &[ProcedureParam],
) -> Result<Statement> {
    let sql = invocation_sql(backend, procedure, params)?;
    Ok(Statement::from_sql_and_values(
        backend,
        sql,
        params.iter().map(|param| param.value.clone()),
    ))
}

/// 执行存储过程，不返回结果行
pub async fn execute_stored_procedure<C>(
    conn: &C,
    procedure: StoredProcedure,
    params: &[ProcedureParam],
) -> Result<ExecResult>
where
    C: ConnectionTrait,
{
    let statement = invocation_statement(conn.get_database_backend(), procedure, params)?;
    debug!("Executing stored procedure: {}", statement.sql);

    Ok(conn.execute(statement).await?)
}

/// 构造返回结果集的存储过程查询
///
/// 返回的 selector 是惰性的，调用 `.all()` / `.one()` / `.stream()` 时才真正访问数据库
pub fn query_stored_procedure<E>(
    backend: DbBackend,
    procedure: StoredProcedure,
    params: &[ProcedureParam],
) -> Result<SelectorRaw<SelectModel<E::Model>>>
where
    E: EntityTrait,
{
    let statement = invocation_statement(backend, procedure, params)?;
    debug!("Prepared stored procedure query: {}", statement.sql);

    Ok(E::find().from_raw_sql(statement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Item, ItemModel};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr, Transaction};

    #[test]
    fn test_invocation_sql_for_procedure_without_parameters() {
        let sql = invocation_sql(DbBackend::Postgres, StoredProcedure::DeleteItems, &[]).unwrap();
        assert_eq!(sql, "CALL delete_items()");
    }

    #[test]
    fn test_invocation_sql_for_function_with_named_parameters() {
        let params = vec![ProcedureParam::new("label", "item 2")];
        let sql = invocation_sql(DbBackend::Postgres, StoredProcedure::GetItems, &params).unwrap();
        assert_eq!(sql, "SELECT * FROM get_items(label => $1)");

        let params = vec![
            ProcedureParam::new("label", "item 2"),
            ProcedureParam::new("limit_to", 10),
        ];
        let sql = invocation_sql(DbBackend::Postgres, StoredProcedure::GetItems, &params).unwrap();
        assert_eq!(sql, "SELECT * FROM get_items(label => $1, limit_to => $2)");
    }

    #[test]
    fn test_invalid_parameter_name_is_rejected() {
        let params = vec![ProcedureParam::new("label); DROP TABLE items; --", "x")];
        let err = invocation_sql(DbBackend::Postgres, StoredProcedure::GetItems, &params)
            .unwrap_err();
        assert!(matches!(err, ProcError::InvalidParameter(_)));
    }

    #[test]
    fn test_non_postgres_backend_is_rejected() {
        let err = invocation_sql(DbBackend::Sqlite, StoredProcedure::DeleteItems, &[]).unwrap_err();
        assert!(matches!(err, ProcError::UnsupportedBackend(DbBackend::Sqlite)));
    }

    #[tokio::test]
    async fn test_execute_stored_procedure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let result = execute_stored_procedure(&db, StoredProcedure::DeleteItems, &[])
            .await
            .unwrap();
        assert_eq!(result.rows_affected(), 3);

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "CALL delete_items()",
                []
            )]
        );
    }

    #[tokio::test]
    async fn test_execute_propagates_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Exec(RuntimeErr::Internal(
                "procedure delete_items() does not exist".to_string(),
            ))])
            .into_connection();

        let err = execute_stored_procedure(&db, StoredProcedure::DeleteItems, &[])
            .await
            .unwrap_err();
        match err {
            ProcError::Database(DbErr::Exec(RuntimeErr::Internal(msg))) => {
                assert!(msg.contains("does not exist"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_stored_procedure_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                ItemModel {
                    id: 2,
                    label: "item 2".to_string(),
                },
                ItemModel {
                    id: 3,
                    label: "item 2".to_string(),
                },
            ]])
            .into_connection();

        let params = vec![ProcedureParam::new("label", "item 2")];
        let selector =
            query_stored_procedure::<Item>(DbBackend::Postgres, StoredProcedure::GetItems, &params)
                .unwrap();
        let items = selector.all(&db).await.unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.label == "item 2"));

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT * FROM get_items(label => $1)",
                ["item 2".into()]
            )]
        );
    }

    #[tokio::test]
    async fn test_query_propagates_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                "function get_items() does not exist".to_string(),
            ))])
            .into_connection();

        let selector =
            query_stored_procedure::<Item>(DbBackend::Postgres, StoredProcedure::GetItems, &[])
                .unwrap();
        let err = ProcError::from(selector.all(&db).await.unwrap_err());

        match err {
            ProcError::Database(DbErr::Query(RuntimeErr::Internal(msg))) => {
                assert_eq!(msg, "function get_items() does not exist")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT * FROM get_items()",
                []
            )]
        );
    }

    #[tokio::test]
    async fn test_query_selector_is_lazy() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let params = vec![ProcedureParam::new("label", "item 1")];
        let _selector =
            query_stored_procedure::<Item>(DbBackend::Postgres, StoredProcedure::GetItems, &params)
                .unwrap();

        assert!(db.into_transaction_log().is_empty());
    }
}
