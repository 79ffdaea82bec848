use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::OutputFormat;
use keeper::config::Config;

const CONFIG_TEMPLATE: &str = r#"# keeper configuration

# Base URL of the keeper server
server_url: http://127.0.0.1:3200

# Where credentials.json and vaults.json are kept
# (default: ~/.local/share/keeper)
# data_dir: ~/.local/share/keeper

# Local profile; each profile has its own login and vault
# (default: the OS user name)
# profile: default

# Seconds to wait for each server call (login is not limited)
request_timeout_secs: 3
"#;

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print_config(config),
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config
                    .config_file
                    .clone()
                    .unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'keeper config show' to view current configuration.");
                    return Ok(());
                }

                write_template(&config_path)?;
                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

fn print_config(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("server_url: {}", config.server_url.value);
    println!("  source: {}", config.server_url.source);
    println!();

    println!("data_dir: {}", config.data_dir.value.display());
    println!("  source: {}", config.data_dir.source);
    println!();

    println!("profile: {}", config.profile.value);
    println!("  source: {}", config.profile.source);
    println!();

    println!("request_timeout_secs: {}", config.request_timeout_secs.value);
    println!("  source: {}", config.request_timeout_secs.source);
}

fn write_template(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(CONFIG_TEMPLATE.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_template_loads() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        write_template(&path).unwrap();

        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.server_url.value, "http://127.0.0.1:3200");
        assert_eq!(config.request_timeout_secs.value, 3);
    }
}
