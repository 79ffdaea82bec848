use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{
    AccountArgs, ConfigCommand, DeleteArgs, GetArgs, ListArgs, SaveCommand, SyncCommand,
};
use keeper::client::{Driver, KeeperClient, Session};
use keeper::config::Config;

#[derive(Parser)]
#[command(name = "keeper")]
#[command(version)]
#[command(about = "A secrets vault that syncs across devices", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and start an empty vault
    Register(AccountArgs),

    /// Log in and merge the server's vault into the local one
    Login(AccountArgs),

    /// Sync with the server
    Sync(SyncCommand),

    /// Show a record
    Get(GetArgs),

    /// Create or update a record
    Save(SaveCommand),

    /// Delete a record
    Delete(DeleteArgs),

    /// List records held locally
    List(ListArgs),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let mut session = Session::load(config.data_dir.value.clone())?;
    let client = KeeperClient::new(&config.server_url.value, config.request_timeout());
    let mut driver = Driver::new(&mut session, client, config.profile.value.clone());

    execute_command(&command, &mut driver).await?;

    session.persist()?;
    Ok(())
}

async fn execute_command(
    command: &Commands,
    driver: &mut Driver<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Register(args) => args.register(driver).await,
        Commands::Login(args) => args.login(driver).await,
        Commands::Sync(cmd) => cmd.run(driver).await,
        Commands::Get(args) => args.run(driver).await,
        Commands::Save(cmd) => cmd.run(driver).await,
        Commands::Delete(args) => args.run(driver).await,
        Commands::List(args) => args.run(driver),
        // Handled before a session is opened.
        Commands::Config(_) => Ok(()),
    }
}
