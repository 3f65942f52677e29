mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{config::ConfigCommand, get::GetCommand, send::SendCommand, Reported};
use conduit_client::Client;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "cli for talking to a conduit json api server", long_about = None)]
struct Cli {
    /// Server url (overides config)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Output format (table or json)
    #[arg(long, global = true, value_parser = ["table", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Fetch an endpoint through the query cache
    Get(GetCommand),
    /// Run a one-shot mutation against an endpoint
    Send(SendCommand),
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // already shown to the user by the notifier
        if !err.is::<Reported>() {
            eprintln!("{}\n{:#}", "Error:".red().bold(), err);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Config { command } => command.clone().execute(),
        Command::Get(_) | Command::Send(_) => {
            let (client, output_format) = setup_client_and_format(&cli)?;

            match cli.command {
                Command::Get(command) => command.execute(&client, &output_format).await,
                Command::Send(command) => command.execute(&client, &output_format).await,
                _ => unreachable!(),
            }
        }
    }
}

fn setup_client_and_format(cli: &Cli) -> Result<(Client, config::OutputFormat)> {
    let cfg = config::load_config().context("Fail to load config")?;

    let filter = EnvFilter::builder()
        .with_default_directive(cfg.log_level().into())
        .from_env_lossy();
    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let server_url = cli.server.as_ref().unwrap_or(&cfg.server_url);
    debug!(server_url = %server_url, "create client");
    let client = Client::new(server_url.clone()).with_notifier(Arc::new(output::notify));

    let output_format = cli
        .output
        .as_deref()
        .map(|fmt| match fmt {
            "json" => config::OutputFormat::Json,
            _ => config::OutputFormat::Table,
        })
        .unwrap_or(cfg.output_format);

    Ok((client, output_format))
}
