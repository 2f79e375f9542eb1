use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use versioned_procs::stored_procedures::{self, StoredProcedure};
use versioned_procs::{logging, Context, StorageConfigManager};

#[derive(Parser, Debug)]
#[command(name = "versioned-procs", version, about = "Versioned stored procedures")]
struct Cli {
    /// Path to storage.json (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// PostgreSQL connection URL, overrides config file and DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// trace | debug | info | warn | error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations
    Up {
        /// Number of migrations to apply (all when omitted)
        #[arg(short = 'n', long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        /// Number of migrations to roll back
        #[arg(short = 'n', long, default_value_t = 1)]
        steps: u32,
    },
    /// Show migration status
    Status,
    /// Insert an item
    Add { label: String },
    /// Query items by label through get_items
    Get { label: String },
    /// List all items
    List,
    /// Delete all items through delete_items
    DeleteAll,
    /// Print the installed body of a stored procedure
    Source { procedure: StoredProcedure },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => StorageConfigManager::with_path(path.clone()),
        None => StorageConfigManager::new(),
    }
    .context("Failed to load storage configuration")?;

    let mut config = manager.config().clone();
    config.apply_database_url_override(cli.database_url.clone());
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    let _guard = logging::init_tracing(&config.logging)?;
    tracing::debug!("Using storage configuration {:?}", manager.config_path());

    let context = Context::connect(&config)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Command::Up { steps } => context.migrate_up(steps).await?,
        Command::Down { steps } => context.migrate_down(Some(steps)).await?,
        Command::Status => {
            for state in context.migration_status().await? {
                let marker = if state.applied { "applied" } else { "pending" };
                println!("{:<8} {}", marker, state.name);
            }
        }
        Command::Add { label } => {
            let item = context.add_item(&label).await?;
            println!("{}\t{}", item.id, item.label);
        }
        Command::Get { label } => {
            for item in context.fetch_items(&label).await? {
                println!("{}\t{}", item.id, item.label);
            }
        }
        Command::List => {
            for item in context.list_items().await? {
                println!("{}\t{}", item.id, item.label);
            }
        }
        Command::DeleteAll => context.delete_items().await?,
        Command::Source { procedure } => {
            let versions = stored_procedures::available_versions(procedure);
            println!(
                "{}({}) embedded versions: {:?} (latest {:?})",
                procedure,
                procedure.parameters().join(", "),
                versions,
                stored_procedures::latest_version(procedure)
            );
            match context.routine_source(procedure).await? {
                Some(source) => println!("{}", source.trim()),
                None => println!("{} is not installed", procedure),
            }
        }
    }

    Ok(())
}
