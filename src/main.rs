use anyhow::Result;
use clap::{Parser, Subcommand};
use unicorn_sport::{auth::Role, config::Config};
use unicorn_sport_access::Tier;

mod cli;

/// unicorn-sport - Football scouting marketplace API
#[derive(Parser)]
#[command(name = "unicorn-sport")]
#[command(about = "Player profiles, match videos and scouting subscriptions", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run database migrations
    Migrate,
    /// Drop database if exists and recreate with migrations
    Reset,
    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    /// Change the role of an account
    SetRole {
        #[arg(long)]
        email: String,

        #[arg(long, value_enum)]
        role: Role,
    },
    /// Put an account on a subscription tier, bypassing payments
    SetTier {
        #[arg(long)]
        email: String,

        #[arg(long)]
        tier: Tier,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    unicorn_sport::observability::init_observability(
        "unicorn-sport",
        env!("CARGO_PKG_VERSION"),
        &config.observability,
    )?;

    match cli.command {
        Commands::Serve { host, port } => cli::server::serve(config, host, port).await,
        Commands::Migrate => cli::database::migrate(&config).await,
        Commands::Reset => cli::database::reset(&config).await,
        Commands::User(UserCommands::SetRole { email, role }) => {
            cli::user::set_role(&config, &email, role).await
        }
        Commands::User(UserCommands::SetTier { email, tier }) => {
            cli::user::set_tier(&config, &email, tier).await
        }
    }
}
