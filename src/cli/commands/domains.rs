use clap::Subcommand;

use crate::cli::utils::*;
use crate::cli::CliContext;

#[derive(Subcommand)]
pub enum DomainsCommands {
    #[command(about = "Recompute and list allowed domains from the admin database")]
    List,
}

pub async fn handle(cmd: DomainsCommands, ctx: &CliContext) -> anyhow::Result<()> {
    match cmd {
        DomainsCommands::List => {
            // Open the client first so the recompute has something to walk
            ctx.registry.get_client(&ctx.route.region, &ctx.route.environment).await?;
            ctx.domains.recompute(ctx.registry.admin_database()).await?;

            let domains = ctx.domains.allowed_origins();
            if domains.is_empty() {
                return output_empty_collection(&ctx.output, "domains", "No domains configured");
            }
            output_list(&ctx.output, "domains", &domains)
        }
    }
}
