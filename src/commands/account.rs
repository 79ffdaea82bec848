use clap::Args;

use keeper::client::Driver;

/// Credentials for register and login
#[derive(Debug, Args)]
pub struct AccountArgs {
    /// Account login
    #[arg(long, short)]
    pub login: String,

    /// Account password
    #[arg(long, short)]
    pub password: String,
}

impl AccountArgs {
    pub async fn register(
        &self,
        driver: &mut Driver<'_>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.login.trim().is_empty() || self.password.is_empty() {
            return Err("Login and password cannot be empty".into());
        }

        driver.register(self.login.trim(), &self.password).await?;
        println!(
            "Registered {} (profile: {}). Your vault is empty.",
            self.login.trim(),
            driver.profile()
        );
        Ok(())
    }

    pub async fn login(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let report = driver.login(self.login.trim(), &self.password).await?;
        println!("Logged in as {} (profile: {})", self.login.trim(), driver.profile());
        println!("Vault: {}", report);
        Ok(())
    }
}
