mod supervisor_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "kartina",
    about = "Kartina — Telegram bot that draws with Stable Diffusion",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot in the foreground.
    Run,
    /// Start a detached bot instance (offers to stop running ones first).
    Start,
    /// Stop every running bot instance.
    Stop,
    /// Show pid, start time and resource usage of running instances.
    Status,
}

/// Initialise tracing from `RUST_LOG` or the `--log-level` flag.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "kartina starting");

    match cli.command {
        Commands::Run => run().await,
        Commands::Start => supervisor_commands::handle_start(),
        Commands::Stop => supervisor_commands::handle_stop(),
        Commands::Status => supervisor_commands::handle_status(),
    }
}

async fn run() -> anyhow::Result<()> {
    let mut config = kartina_config::discover_and_load();
    kartina_config::apply_env_overrides(&mut config);
    kartina_telegram::run_bot(config).await
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["kartina", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run));

        let cli = Cli::try_parse_from(["kartina", "status", "--log-level", "debug"]).unwrap();
        assert!(matches!(cli.command, Commands::Status));
        assert_eq!(cli.log_level, "debug");

        let cli = Cli::try_parse_from(["kartina", "--json-logs", "stop"]).unwrap();
        assert!(matches!(cli.command, Commands::Stop));
        assert!(cli.json_logs);
    }

    #[test]
    fn a_bare_invocation_asks_for_a_subcommand() {
        assert!(Cli::try_parse_from(["kartina"]).is_err());
    }
}
