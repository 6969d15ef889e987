use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpProductStore, MissingProductStore, ProductListController, ProductStore};
use shared::domain::ProductField;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, normalize_base_url, Settings};
use render::render_table;

#[derive(Parser, Debug)]
#[command(name = "admin", about = "Manage the products list of a product backend")]
struct Args {
    /// Backend base URL; `/data/products` is appended.
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Print the products table.
    List,
    /// Append the placeholder product.
    CreateDummy,
    /// Edit the row shown as number ROW, e.g. `edit 2 price=150 name=Widget`.
    Edit {
        row: usize,
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(ProductField, String)>,
    },
    /// Delete the row shown as number ROW.
    Delete { row: usize },
}

fn parse_assignment(raw: &str) -> Result<(ProductField, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.parse::<ProductField>().map_err(|err| err.to_string())?;
    Ok((field, value.to_string()))
}

fn row_index(len: usize, row: usize) -> Result<usize> {
    match row.checked_sub(1) {
        Some(index) if index < len => Ok(index),
        _ => Err(anyhow!(
            "row {row} does not exist; the table has {len} rows"
        )),
    }
}

async fn run_command(controller: &ProductListController, command: Command) -> Result<()> {
    controller.load().await.context("failed to load products")?;

    match command {
        Command::List => {}
        Command::CreateDummy => {
            let created = controller
                .create_dummy()
                .await
                .context("failed to create product")?;
            info!(id = %created.id, "created placeholder product");
        }
        Command::Edit { row, assignments } => {
            let index = row_index(controller.len().await, row)?;
            controller.begin_edit(index).await?;
            for (field, value) in assignments {
                controller.update_field(field, value).await?;
            }
            controller
                .save()
                .await
                .with_context(|| format!("failed to save row {row}"))?;
        }
        Command::Delete { row } => {
            let index = row_index(controller.len().await, row)?;
            let id = controller
                .items()
                .await
                .get(index)
                .map(|product| product.id.clone())
                .ok_or_else(|| anyhow!("row {row} disappeared before delete"))?;
            controller
                .delete(&id, index)
                .await
                .with_context(|| format!("failed to delete row {row}"))?;
        }
    }
    Ok(())
}

fn build_store(settings: &Settings) -> Result<Arc<dyn ProductStore>> {
    let Some(base_url) = normalize_base_url(&settings.api_base_url)? else {
        warn!("no api base url configured; every backend call will fail");
        return Ok(Arc::new(MissingProductStore));
    };
    let store = HttpProductStore::with_timeout(&base_url, settings.request_timeout())
        .context("failed to set up product backend client")?;
    info!(url = %store.collection_url(), "using product backend");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    let controller = ProductListController::new(build_store(&settings)?);

    let outcome = run_command(&controller, args.command.unwrap_or(Command::List)).await;
    print!("{}", render_table(&controller.rows().await));
    outcome
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
