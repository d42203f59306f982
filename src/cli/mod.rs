pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{ConnectionRegistry, MemoryConnector, PgConnector, SchemeConnector};
use crate::services::{DomainRegistry, Route};

#[derive(Parser)]
#[command(name = "docbase")]
#[command(about = "Docbase CLI - tenant and schema administration")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Region of the database server (defaults to DATABASE_DEFAULT_REGION)")]
    pub region: Option<String>,

    #[arg(long, global = true, help = "Environment of the database server (defaults to DATABASE_DEFAULT_ENV)")]
    pub env: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Tenant database lifecycle")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Inspect stored collection schemas")]
    Schema {
        #[command(subcommand)]
        cmd: commands::schema::SchemaCommands,
    },

    #[command(about = "Allowed cross-origin domains")]
    Domains {
        #[command(subcommand)]
        cmd: commands::domains::DomainsCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Registry and routing shared by every command
pub struct CliContext {
    pub registry: Arc<ConnectionRegistry>,
    pub domains: Arc<DomainRegistry>,
    pub route: Route,
    pub output: OutputFormat,
}

impl CliContext {
    pub fn new(config: &AppConfig, cli: &Cli) -> Self {
        let database = config.database.clone();
        let route = Route::new(
            cli.region.clone().unwrap_or_else(|| database.default_region.clone()),
            cli.env.clone().unwrap_or_else(|| database.default_environment.clone()),
        );
        let connector = SchemeConnector::new(MemoryConnector::new(), PgConnector::from_config(&database));
        let registry = Arc::new(ConnectionRegistry::new(database, Arc::new(connector)));

        Self {
            domains: Arc::new(DomainRegistry::new(registry.clone())),
            registry,
            route,
            output: OutputFormat::from_cli(cli),
        }
    }
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let ctx = CliContext::new(config, &cli);

    let result = match cli.command {
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, &ctx).await,
        Commands::Schema { cmd } => commands::schema::handle(cmd, &ctx).await,
        Commands::Domains { cmd } => commands::domains::handle(cmd, &ctx).await,
    };

    ctx.registry.close_all().await;
    result
}
