//! Stored procedures versioned alongside schema migrations.
//!
//! Routine bodies live in `stored_procedures/<name>_<NN>.sql`, are embedded at
//! build time and applied by SeaORM migrations. [`context::Context`] calls them
//! through the generic [`executor`].

pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod executor;
pub mod logging;
pub mod migration;
pub mod stored_procedures;

pub use config::{StorageConfig, StorageConfigManager};
pub use context::{Context, MigrationState};
pub use error::{ProcError, Result};
pub use executor::ProcedureParam;
pub use migration::Migrator;
pub use stored_procedures::{StoredProcedure, StoredProcedureVersion};
