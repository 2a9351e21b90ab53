use clap::{Parser, Subcommand};

mod commands;

use commands::{CheckConfigArgs, RunArgs};

#[derive(Parser)]
#[command(name = "intraday-bot")]
#[command(about = "Intraday MA-crossover trading session for Kite Connect", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run today's trading session until square-off
    Run(RunArgs),
    /// Load and validate configuration, then print the resolved session
    CheckConfig(CheckConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    match &cli.command {
        Commands::Run(RunArgs {
            log_file: Some(path),
            ..
        }) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        }
    }

    match cli.command {
        Commands::Run(args) => commands::run_session(args).await?,
        Commands::CheckConfig(args) => commands::check_config(&args)?,
    }

    Ok(())
}
