//! SeaORM 实体模块

pub mod item;

/// Prelude 模块，重新导出常用的 SeaORM 实体和类型
pub mod prelude {
    pub use super::{item::Column as ItemColumn, item::Entity as Item};
}

pub use item::Column as ItemColumn;
pub use item::Entity as Item;
pub use item::Model as ItemModel;
