//! `narrate` binary: converts dialogue scripts into narrated audio files.

use clap::Parser;
use narrate_cli::{cli, load_config, logging, Cli};
use std::path::PathBuf;
use std::process::ExitCode;

fn resolve_config_path(cli: &Cli) -> (PathBuf, &'static str) {
    if let Some(path) = &cli.config {
        return (path.clone(), "cli-arg");
    }

    if let Ok(path) = std::env::var("NARRATE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (PathBuf::from(path), "env-var");
        }
    }

    (PathBuf::from("narrate.toml"), "default")
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let args = Cli::parse();

    let (config_path, config_source) = resolve_config_path(&args);
    let config = match load_config(Some(config_path.as_path())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("narrate: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = %config_path.display(),
        "resolved startup configuration path"
    );
    if let Ok(env_file) = dotenv {
        tracing::info!(path = %env_file.display(), "loaded environment file");
    }

    match cli::run(args, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}
