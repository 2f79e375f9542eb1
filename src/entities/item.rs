use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item 实体
///
/// 对应数据库表 items，也是 `get_items` 存储函数的结果结构
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// 主键，自增
    #[sea_orm(primary_key)]
    pub id: i32,

    /// 标签
    pub label: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// 新建待插入的 item，id 由数据库生成
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: sea_orm::ActiveValue::Set(label.into()),
            ..Default::default()
        }
    }
}
