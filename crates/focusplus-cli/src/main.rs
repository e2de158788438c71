use clap::{Parser, Subcommand};
use focusplus_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusplus", version, about = "FOCUSPLUS+ focus mode CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Allowed-app registry
    Apps {
        #[command(subcommand)]
        action: commands::apps::AppsAction,
    },
    /// Focus settings (durations, strict mode, breaks)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Focus statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Sessions recorded on one day
    History(commands::history::HistoryArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Delete all focus data
    Reset(commands::reset::ResetArgs),
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_env("FOCUSPLUS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action, &config),
        Commands::Apps { action } => commands::apps::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Stats { action } => commands::stats::run(action, &config),
        Commands::History(args) => commands::history::run(args, &config),
        Commands::Config { action } => commands::config::run(action, config),
        Commands::Reset(args) => commands::reset::run(args, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
