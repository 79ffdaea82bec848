use clap::ValueEnum;

mod account;
mod config_cmd;
mod record;
mod sync_cmd;

pub use account::AccountArgs;
pub use config_cmd::ConfigCommand;
pub use record::{DeleteArgs, GetArgs, ListArgs, SaveCommand};
pub use sync_cmd::SyncCommand;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
