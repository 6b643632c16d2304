mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "grindbot",
    about = "Run chat game commands on a fixed schedule, halting for a human on any challenge",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (JSON, or YAML by extension)
    #[arg(long, global = true, env = "GRINDBOT_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Replace emoji with bracketed ASCII tags
    #[arg(long, global = true)]
    ascii: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the command loop
    Run {
        /// Stop after this many cycles (default: until quit)
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Validate the config and check token and channel access
    Check,

    /// Print the effective config with the token redacted
    Config,

    /// Look up gem names by id
    Gems {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let out = output::Printer::new(cli.ascii);
    let result = match cli.command {
        Commands::Run { cycles } => cmd::run::run(&cli.config, cycles, &out),
        Commands::Check => cmd::check::run(&cli.config, &out),
        Commands::Config => cmd::config::run(&cli.config),
        Commands::Gems { ids } => cmd::gems::run(&ids, &out),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
