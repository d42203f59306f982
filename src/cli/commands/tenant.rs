use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::CliContext;
use crate::services::{initialize_database, TenantService};

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "Create and seed a database from the built-in templates")]
    Init {
        #[arg(help = "Database name")]
        name: String,

        #[arg(long, help = "Succeed without changes when the database already exists")]
        bypass: bool,
    },

    #[command(about = "Create a tenant and register it in the admin apps collection")]
    Create {
        #[arg(help = "Tenant name")]
        name: String,

        #[arg(long = "domain", help = "Allowed CORS origin (repeatable)")]
        domains: Vec<String>,
    },

    #[command(about = "Drop a tenant database")]
    Drop {
        #[arg(help = "Tenant name")]
        name: String,
    },

    #[command(about = "Move a tenant's collections to a new database")]
    Rename {
        #[arg(help = "Current tenant name")]
        source: String,

        #[arg(help = "New tenant name")]
        target: String,
    },
}

pub async fn handle(cmd: TenantCommands, ctx: &CliContext) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::Init { name, bypass } => {
            let report = initialize_database(&ctx.domains, &ctx.route, &name, bypass).await?;
            output_success(
                &ctx.output,
                &format!("{}: {}", report.message, report.database),
                Some(json!({ "database": report.database, "created": report.created, "collections": report.collections })),
            )
        }
        TenantCommands::Create { name, domains } => {
            let info = TenantService::new(ctx.domains.clone())
                .create_tenant(&ctx.route, &name, &domains)
                .await?;
            output_success(
                &ctx.output,
                &format!("Created tenant '{}' on {}/{}", info.name, info.region, info.environment),
                Some(json!({ "tenant": info })),
            )
        }
        TenantCommands::Drop { name } => {
            TenantService::new(ctx.domains.clone()).drop_tenant(&ctx.route, &name).await?;
            output_success(&ctx.output, &format!("Dropped tenant '{}'", name), Some(json!({ "name": name })))
        }
        TenantCommands::Rename { source, target } => {
            TenantService::new(ctx.domains.clone())
                .rename_tenant(&ctx.route, &source, &target)
                .await?;
            output_success(
                &ctx.output,
                &format!("Renamed tenant '{}' to '{}'", source, target),
                Some(json!({ "from": source, "to": target })),
            )
        }
    }
}
