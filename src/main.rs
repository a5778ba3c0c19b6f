//! Itinera CLI entry point.

use anyhow::Result;
use clap::Parser;
use itinera::cli::{commands, Cli, Commands};
use itinera::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(|p| Settings::expand_path(p));
    let settings = Settings::load_from(config_path.as_ref())?;

    // -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("itinera={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Plan {
            text,
            show_plan,
            hide_tools,
        } => {
            commands::run_plan(&text.join(" "), *show_plan, *hide_tools, settings).await?;
        }

        Commands::Chat { hide_tools } => {
            commands::run_chat(*hide_tools, settings).await?;
        }

        Commands::Docs { action } => {
            commands::run_docs(action, settings).await?;
        }

        Commands::Hello { name } => {
            commands::run_hello(name.clone())?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }
    }

    Ok(())
}
