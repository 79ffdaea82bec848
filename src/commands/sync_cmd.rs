//! Sync CLI commands for synchronizing with the server.

use clap::{Args, Subcommand};

use keeper::client::Driver;

/// Pull the server's vault and merge it into the local one
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show server and session status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.sync(driver).await,
            Some(SyncSubcommand::Status) => self.status(driver).await,
        }
    }

    async fn sync(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        println!("Syncing with {}...", driver.server_url());

        let report = driver.sync().await?;

        if report.from_remote == 0 {
            println!("Already up to date ({} records).", report.total());
        } else {
            println!("Sync complete: {}", report);
        }
        Ok(())
    }

    async fn status(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Status");
        println!("===========");
        println!();
        println!("Server:   {}", driver.server_url());
        println!("Profile:  {}", driver.profile());
        println!(
            "Session:  {}",
            if driver.is_authenticated() {
                "logged in"
            } else {
                "not logged in"
            }
        );
        println!("Records:  {} held locally", driver.list(None).len());
        println!();

        print!("Server status: ");
        match driver.server_health().await {
            Ok(health) => println!("✓ {} (version {})", health.status, health.version),
            Err(e) => println!("✗ {}", e),
        }
        Ok(())
    }
}
