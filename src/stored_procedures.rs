//! 存储过程定义与版本化 SQL 资源
//!
//! 每个存储过程的每个版本对应 `stored_procedures/` 目录下的一个 SQL 文件，
//! 文件名格式为 `<procedure>_<NN>.sql`（NN 为两位补零的版本号）。
//! 文件在编译期嵌入二进制，已发布的版本不可修改，升级只能新增文件。

use crate::error::{ProcError, Result};
use rust_embed::Embed;

/// Embedded routine bodies from the `stored_procedures/` directory
#[derive(Embed)]
#[folder = "stored_procedures/"]
struct ProcedureSources;

/// 已知的存储过程
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum StoredProcedure {
    /// 删除全部 items
    DeleteItems,
    /// 按 label 查询 items
    GetItems,
}

/// How a routine is declared server-side, which decides how it is invoked
/// and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    /// `CREATE PROCEDURE`, invoked with `CALL`
    Procedure,
    /// Set-returning `CREATE FUNCTION`, invoked with `SELECT * FROM`
    Function,
}

impl RoutineKind {
    /// SQL keyword used in DDL (`DROP PROCEDURE` / `DROP FUNCTION`)
    pub fn keyword(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "PROCEDURE",
            RoutineKind::Function => "FUNCTION",
        }
    }
}

impl StoredProcedure {
    /// Routine name in the database
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn kind(&self) -> RoutineKind {
        match self {
            StoredProcedure::DeleteItems => RoutineKind::Procedure,
            StoredProcedure::GetItems => RoutineKind::Function,
        }
    }

    /// Declared parameter names, in declaration order
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            StoredProcedure::DeleteItems => &[],
            StoredProcedure::GetItems => &["label"],
        }
    }

    /// Shorthand for [`StoredProcedureVersion::new`]
    pub fn version(self, version: u32) -> StoredProcedureVersion {
        StoredProcedureVersion::new(self, version)
    }
}

/// A `(procedure, version)` pair, resolved to exactly one embedded SQL file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoredProcedureVersion {
    pub procedure: StoredProcedure,
    pub version: u32,
}

impl StoredProcedureVersion {
    pub fn new(procedure: StoredProcedure, version: u32) -> Self {
        Self { procedure, version }
    }

    /// 资源文件名，例如 `get_items_02.sql`
    pub fn resource_name(&self) -> String {
        format!("{}_{:02}.sql", self.procedure, self.version)
    }

    /// 读取该版本的 SQL 文本
    ///
    /// 资源缺失属于打包错误，返回 [`ProcError::ResourceNotFound`]
    pub fn load(&self) -> Result<String> {
        let resource_name = self.resource_name();
        let file = ProcedureSources::get(&resource_name)
            .ok_or_else(|| ProcError::ResourceNotFound(resource_name.clone()))?;

        String::from_utf8(file.data.into_owned())
            .map_err(|_| ProcError::InvalidResource(resource_name))
    }
}

/// All embedded versions of a procedure, ascending
pub fn available_versions(procedure: StoredProcedure) -> Vec<u32> {
    let prefix = format!("{}_", procedure);
    let mut versions: Vec<u32> = ProcedureSources::iter()
        .filter_map(|path| {
            path.strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(".sql"))
                .and_then(|digits| digits.parse::<u32>().ok())
        })
        .collect();
    versions.sort_unstable();
    versions
}

/// Highest embedded version of a procedure
pub fn latest_version(procedure: StoredProcedure) -> Option<u32> {
    available_versions(procedure).last().copied()
}
