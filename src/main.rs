//! gbr-serve - Main Entry Point

use clap::Parser;
use gbr_serve::cli::{cmd_predict, cmd_serve, Cli, Commands, ServeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `predict` output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gbr_serve=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => {
            cmd_serve(args).await?;
        }
        Some(Commands::Predict { model, input }) => {
            cmd_predict(&model, input.as_deref())?;
        }
        None => {
            cmd_serve(ServeArgs::default()).await?;
        }
    }

    Ok(())
}
