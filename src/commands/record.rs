use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;

use super::OutputFormat;
use keeper::client::{DeleteOutcome, Driver, Source};
use keeper::models::{Kind, Payload, Record};

/// Show one record
#[derive(Debug, Args)]
pub struct GetArgs {
    /// Record kind: pair, text, bin or card
    pub kind: Kind,

    /// Record title
    pub title: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write a binary record's body to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl GetArgs {
    pub async fn run(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let Some((record, source)) = driver.get(self.kind, &self.title).await? else {
            println!("{} '{}': not found", self.kind, self.title);
            return Ok(());
        };

        if let Some(path) = &self.output {
            match &record.payload {
                Payload::Bin { body } => {
                    fs::write(path, body)?;
                    println!("Wrote {} bytes to {}", body.len(), path.display());
                    return Ok(());
                }
                _ => return Err("--output only applies to bin records".into()),
            }
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            OutputFormat::Text => {
                println!("{}", record);
                if source == Source::Remote {
                    println!("(fetched from server)");
                }
            }
        }
        Ok(())
    }
}

/// Create or update a record
#[derive(Debug, Args)]
pub struct SaveCommand {
    #[command(subcommand)]
    pub command: SaveSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum SaveSubcommand {
    /// Save a login/password pair
    Pair {
        title: String,

        #[arg(long)]
        login: String,

        #[arg(long)]
        pass: String,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Save free text
    Text {
        title: String,

        #[arg(long)]
        body: String,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Save binary data, given as base64 or read from a file
    Bin {
        title: String,

        /// Base64-encoded body
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        body: Option<String>,

        /// Read the body from this file
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Save a payment card
    Card {
        title: String,

        #[arg(long)]
        number: String,

        /// Expiry date, e.g. 09/27
        #[arg(long)]
        expdate: String,

        #[arg(long)]
        comment: Option<String>,
    },
}

impl SaveSubcommand {
    /// Builds the record to send. Its version is assigned by the driver.
    pub fn to_record(&self) -> Result<Record, Box<dyn std::error::Error>> {
        let (title, payload, comment) = match self {
            SaveSubcommand::Pair {
                title,
                login,
                pass,
                comment,
            } => (
                title,
                Payload::Pair {
                    login: login.clone(),
                    pass: pass.clone(),
                },
                comment,
            ),
            SaveSubcommand::Text {
                title,
                body,
                comment,
            } => (title, Payload::Text { body: body.clone() }, comment),
            SaveSubcommand::Bin {
                title,
                body,
                file,
                comment,
            } => {
                let bytes = match (body, file) {
                    (Some(encoded), _) => STANDARD
                        .decode(encoded.trim())
                        .map_err(|e| format!("--body is not valid base64: {}", e))?,
                    (None, Some(path)) => fs::read(path)
                        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?,
                    (None, None) => return Err("Provide --body or --file".into()),
                };
                (title, Payload::Bin { body: bytes }, comment)
            }
            SaveSubcommand::Card {
                title,
                number,
                expdate,
                comment,
            } => (
                title,
                Payload::Card {
                    number: number.clone(),
                    expdate: expdate.clone(),
                },
                comment,
            ),
        };

        if title.trim().is_empty() {
            return Err("Title cannot be empty".into());
        }
        Ok(Record::new(title.trim(), payload).with_comment(comment.clone()))
    }
}

impl SaveCommand {
    pub async fn run(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let record = self.command.to_record()?;
        let kind = record.kind();
        let title = record.title.clone();

        match driver.save(record).await {
            Ok(version) => {
                println!("Saved {} '{}' (version {})", kind, title, version);
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                eprintln!("{}", e);
                eprintln!("Run `keeper sync` to fetch the newer version, then save again.");
                Err(format!("{} '{}' was not saved", kind, title).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Delete a record
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Record kind: pair, text, bin or card
    pub kind: Kind,

    /// Record title
    pub title: String,
}

impl DeleteArgs {
    pub async fn run(&self, driver: &mut Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        match driver.delete(self.kind, &self.title).await? {
            DeleteOutcome::Deleted => {
                println!("Deleted {} '{}'", self.kind, self.title);
            }
            DeleteOutcome::NotFoundLocally => {
                println!(
                    "Nothing to delete: no {} '{}' in the local vault.",
                    self.kind, self.title
                );
                println!("Run `keeper sync` first if it was saved on another device.");
            }
        }
        Ok(())
    }
}

/// List records held locally
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only list this kind
    pub kind: Option<Kind>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ListArgs {
    pub fn run(&self, driver: &Driver<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let records = driver.list(self.kind);

        if records.is_empty() {
            println!("No records found");
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
            OutputFormat::Text => {
                println!("{:<6}  {:<30}  {:>7}  COMMENT", "KIND", "TITLE", "VERSION");
                println!("{}", "-".repeat(70));
                for record in &records {
                    let title = if record.title.chars().count() > 30 {
                        format!("{}...", record.title.chars().take(27).collect::<String>())
                    } else {
                        record.title.clone()
                    };
                    println!(
                        "{:<6}  {:<30}  {:>7}  {}",
                        record.kind(),
                        title,
                        record.version,
                        record.comment.as_deref().unwrap_or("")
                    );
                }
                println!("\nTotal: {} record(s)", records.len());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pair_to_record() {
        let record = SaveSubcommand::Pair {
            title: " mail ".to_string(),
            login: "alice".to_string(),
            pass: "pw".to_string(),
            comment: Some("work".to_string()),
        }
        .to_record()
        .unwrap();

        assert_eq!(record.title, "mail");
        assert_eq!(record.kind(), Kind::Pair);
        assert_eq!(record.comment.as_deref(), Some("work"));
        assert_eq!(record.version, 0);
    }

    #[test]
    fn test_bin_from_base64() {
        let record = SaveSubcommand::Bin {
            title: "blob".to_string(),
            body: Some("AAEC".to_string()),
            file: None,
            comment: None,
        }
        .to_record()
        .unwrap();

        assert_eq!(record.payload, Payload::Bin { body: vec![0, 1, 2] });
    }

    #[test]
    fn test_bin_from_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("key.der");
        fs::write(&path, [9u8, 8, 7]).unwrap();

        let record = SaveSubcommand::Bin {
            title: "key".to_string(),
            body: None,
            file: Some(path),
            comment: None,
        }
        .to_record()
        .unwrap();

        assert_eq!(record.payload, Payload::Bin { body: vec![9, 8, 7] });
    }

    #[test]
    fn test_bin_invalid_base64() {
        let result = SaveSubcommand::Bin {
            title: "blob".to_string(),
            body: Some("not base64!".to_string()),
            file: None,
            comment: None,
        }
        .to_record();

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_title_rejected() {
        let result = SaveSubcommand::Text {
            title: "  ".to_string(),
            body: "x".to_string(),
            comment: None,
        }
        .to_record();

        assert!(result.is_err());
    }
}
