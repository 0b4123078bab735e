use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use usecase_builder::app::App;
use usecase_builder::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            let mut app = App::new().await?;
            app.run_command(cmd).await?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
