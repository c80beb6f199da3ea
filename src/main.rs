use anyhow::{anyhow, Result};
use clap::Parser;
use paperid::cli::{Cli, Commands};
use paperid::commands::{self, Workspace};
use paperid::config::Config;
use paperid::mcp;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    // --log-level beats RUST_LOG, which beats the config file
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref(), &cli.dir)?;
    init_logging(&cli, &config)?;

    match run(cli, config).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<i32> {
    let ws = Workspace::open(&cli.dir, config, cli.recursive)?;

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::NextId { pair, force, ext } => {
            let options = commands::next_id::NextIdOptions {
                pair,
                force,
                extension: ext,
            };
            commands::next_id::run(&ws, &options)?;
        }
        Commands::Ids { id } => {
            commands::ids::run_ids(&ws, &id)?;
        }
        Commands::Resolve { id } => {
            commands::ids::run_resolve(&ws, &id)?;
        }
        Commands::List { format } => {
            commands::list::run_list(&ws, format)?;
        }
        Commands::ById { id, format } => {
            commands::list::run_by_id(&ws, &id, format)?;
        }
        Commands::CheckDuplicates { format } => {
            if commands::list::run_check_duplicates(&ws, format)? {
                return Ok(1);
            }
        }
        Commands::MissingIds => {
            commands::list::run_missing_ids(&ws)?;
        }
        Commands::ListCategories => {
            commands::list::run_categories(&ws)?;
        }
        Commands::Merge {
            id,
            date,
            title,
            category,
            dry_run,
            keep,
        } => {
            let options = commands::merge::MergeOptions {
                ids: id,
                date,
                title,
                category,
                dry_run,
                keep,
            };
            commands::merge::run(&ws, &options)?;
        }
        Commands::Convert { id, execute } => {
            commands::convert::run(&ws, id.as_deref(), execute)?;
        }
        Commands::RebuildIndex => {
            commands::index::run(&ws)?;
        }
    }

    Ok(0)
}
