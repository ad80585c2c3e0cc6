//! esloader エントリーポイント

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use esloader::LoaderConfig;
use esloader::config::LogLevel;
use esloader_cli::cli::effective_log_level;
use esloader_cli::commands::{build_config, run_import, run_sample};
use esloader_cli::{Cli, CliError, Command};

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  // 設定の読み込み (the log level may come from the config file)
  let config = match &cli.command {
    Command::Import(args) => build_config(args),
    Command::Sample(_) => Ok(LoaderConfig::default()),
  };
  let level = config.as_ref().map(LoaderConfig::log_level).unwrap_or_default();
  init_logging(effective_log_level(level, cli.verbose));

  let result = match config {
    Ok(config) => run(&cli.command, config).await,
    Err(e) => Err(e),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!(kind = e.kind().code(), error = %e, "esloader failed");
      e.exit_code()
    }
  }
}

async fn run(command: &Command, config: LoaderConfig) -> Result<(), CliError> {
  match command {
    Command::Import(args) => {
      run_import(args, config).await?;
    }
    Command::Sample(args) => {
      let fit = run_sample(args)?;
      println!("{fit}");
    }
  }
  Ok(())
}

/// ロギングの初期化: `RUST_LOG` wins over the configured level. Logs go to stderr.
fn init_logging(level: LogLevel) {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}
