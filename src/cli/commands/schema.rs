use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{CliContext, OutputFormat};
use crate::model::get_model;
use crate::schema::types::descriptor_map_to_value;
use crate::services::DescribeService;

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "List collections of a database")]
    List {
        #[arg(help = "Database name")]
        db: String,
    },

    #[command(about = "Show the compiled field table of a collection")]
    Show {
        #[arg(help = "Database name")]
        db: String,

        #[arg(help = "Collection name")]
        collection: String,
    },
}

pub async fn handle(cmd: SchemaCommands, ctx: &CliContext) -> anyhow::Result<()> {
    match cmd {
        SchemaCommands::List { db } => {
            let conn = ctx.registry.connect(&ctx.route.region, &ctx.route.environment, &db).await?;
            let names: Vec<String> = DescribeService::new(conn)
                .list()
                .await?
                .into_iter()
                .map(|info| info.name)
                .collect();

            if names.is_empty() {
                return output_empty_collection(&ctx.output, "collections", "No collections");
            }
            output_list(&ctx.output, "collections", &names)
        }
        SchemaCommands::Show { db, collection } => {
            let conn = ctx.registry.connect(&ctx.route.region, &ctx.route.environment, &db).await?;
            let model = get_model(&conn, &collection)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Model not found: {}.{}", db, collection))?;
            let fields = descriptor_map_to_value(model.fields());

            match ctx.output {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({ "name": model.name(), "fields": fields }))?
                    );
                }
                OutputFormat::Text => {
                    println!("{:<24} {}", "FIELD", "TYPE");
                    println!("{}", "-".repeat(48));
                    for (name, field) in model.fields() {
                        println!("{:<24} {}", name, field.to_value());
                    }
                }
            }
            Ok(())
        }
    }
}
