//! Command-line interface
//!
//! `serve` runs the HTTP server (the default when no subcommand is given),
//! `predict` scores one JSON payload offline with the same pipeline code.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::*;
use serde_json::json;

use crate::pipeline::PredictionPipeline;
use crate::records;
use crate::server::{run_server, ErrorStatusPolicy, PredictResponse, ServerConfig};

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }

#[derive(Parser)]
#[command(name = "gbr-serve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve a pre-trained gradient boosting regression pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction server
    Serve(ServeArgs),

    /// Score a JSON payload and print the response body
    Predict {
        /// Pipeline artifact
        #[arg(short, long, default_value = "gbr_pipeline.json")]
        model: PathBuf,

        /// JSON input file, stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Flags that override the environment for `serve`
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Pipeline artifact to load at startup
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Status codes used for failed predictions
    #[arg(long, value_enum)]
    pub error_status: Option<ErrorStatusPolicy>,
}

impl ServeArgs {
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(policy) = self.error_status {
            config.error_status = policy;
        }
        config
    }
}

pub async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.apply(ServerConfig::from_env()?);

    println!();
    println!("  {} {}", "gbr-serve".white().bold(), dim(&format!("v{}", env!("CARGO_PKG_VERSION"))));
    println!("  {} {}", dim("model  "), config.model_path.display());
    println!("  {} {}", dim("predict"), accent(&format!("http://{}:{}/predict", config.host, config.port)));
    println!("  {}", dim("ctrl+c to stop"));
    println!();

    run_server(config).await
}

pub fn cmd_predict(model: &Path, input: Option<&Path>) -> anyhow::Result<()> {
    let pipeline = PredictionPipeline::load(model)
        .with_context(|| format!("failed to load pipeline from {}", model.display()))?;

    let body = match input {
        Some(path) => std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).context("cannot read stdin")?;
            buf
        }
    };

    let start = Instant::now();
    let output = match records::parse_body(&body).and_then(|frame| pipeline.predict(&frame)) {
        Ok(prediction) => serde_json::to_string(&PredictResponse { prediction })?,
        Err(e) => {
            println!("{}", json!({ "error": e.to_string() }));
            anyhow::bail!(e);
        }
    };
    tracing::info!(latency_ms = start.elapsed().as_secs_f64() * 1000.0, "Prediction complete");

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["gbr-serve"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_flags_override_config() {
        let cli = Cli::try_parse_from([
            "gbr-serve", "serve", "--port", "9001", "--model", "m.json", "--error-status", "always-ok",
        ])
        .unwrap();
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        let config = args.apply(ServerConfig::default());
        assert_eq!(config.port, 9001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.model_path, PathBuf::from("m.json"));
        assert_eq!(config.error_status, ErrorStatusPolicy::AlwaysOk);
    }

    #[test]
    fn test_predict_args() {
        let cli = Cli::try_parse_from(["gbr-serve", "predict", "-m", "p.json", "-i", "rows.json"]).unwrap();
        match cli.command {
            Some(Commands::Predict { model, input }) => {
                assert_eq!(model, PathBuf::from("p.json"));
                assert_eq!(input, Some(PathBuf::from("rows.json")));
            }
            _ => panic!("expected predict"),
        }
    }
}
