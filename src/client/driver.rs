//! Client side of the sync protocol.
//!
//! Every operation talks to the server first and touches the session only
//! after the server call succeeded, so a failed call leaves local state as
//! it was. Persisting the session is left to the caller.

use super::api::{ClientError, KeeperClient};
use super::session::Session;
use crate::api::HealthResponse;
use crate::models::{Kind, Record, Vault};
use crate::sync::{combine_with_report, MergeReport};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("profile '{0}' is not logged in, run `keeper login` first")]
    NotAuthenticated(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DriverError {
    /// The server rejected a write because it holds the same or a newer version.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DriverError::Client(e) if e.is_conflict())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing to delete: the title is not in the local vault.
    NotFoundLocally,
}

pub struct Driver<'a> {
    session: &'a mut Session,
    client: KeeperClient,
    profile: String,
}

impl<'a> Driver<'a> {
    pub fn new(session: &'a mut Session, client: KeeperClient, profile: impl Into<String>) -> Self {
        Self {
            session,
            client,
            profile: profile.into(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn server_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token(&self.profile).is_some()
    }

    /// Checks the server is reachable; needs no credential.
    pub async fn server_health(&self) -> Result<HealthResponse, DriverError> {
        Ok(self.client.health().await?)
    }

    /// Creates the account and starts this profile on an empty vault.
    pub async fn register(&mut self, login: &str, pass: &str) -> Result<(), DriverError> {
        let response = self.client.register(login, pass).await?;

        self.session.set_token(&self.profile, response.token);
        self.session.set_vault(&self.profile, Vault::new());
        tracing::info!("Registered {} as profile {}", login, self.profile);
        Ok(())
    }

    /// Authenticates and merges the server's snapshot into the local vault.
    pub async fn login(&mut self, login: &str, pass: &str) -> Result<MergeReport, DriverError> {
        let response = self.client.login(login, pass).await?;

        let remote = Vault::from(response.vault);
        let report = self.merge_remote(&remote);
        self.session.set_token(&self.profile, response.token);
        tracing::info!("Logged in {} as profile {}: {}", login, self.profile, report);
        Ok(report)
    }

    /// Pulls the server's snapshot and merges it into the local vault.
    ///
    /// Titles held only locally are kept.
    pub async fn sync(&mut self) -> Result<MergeReport, DriverError> {
        let token = self.token()?;
        let snapshot = self.client.vault(&token).await?;

        let remote = Vault::from(snapshot);
        let report = self.merge_remote(&remote);
        tracing::info!("Synchronized profile {}: {}", self.profile, report);
        Ok(report)
    }

    /// Looks a title up locally, falling back to the server on a miss.
    ///
    /// A record found remotely is cached in the local vault.
    pub async fn get(
        &mut self,
        kind: Kind,
        title: &str,
    ) -> Result<Option<(Record, Source)>, DriverError> {
        if let Some(record) = self.local().and_then(|v| v.get(kind, title)) {
            return Ok(Some((record.clone(), Source::Local)));
        }

        let token = self.token()?;
        match self.client.get_record(&token, kind, title).await? {
            Some(record) => {
                self.local_mut().insert(record.clone());
                Ok(Some((record, Source::Remote)))
            }
            None => Ok(None),
        }
    }

    /// Sends the record as the next version of its title and keeps it
    /// locally once the server accepted it. Returns the version written.
    pub async fn save(&mut self, record: Record) -> Result<u32, DriverError> {
        let token = self.token()?;

        let version = self
            .local()
            .and_then(|v| v.get(record.kind(), &record.title))
            .map_or(1, |stored| stored.version.saturating_add(1));
        let record = record.with_version(version);

        self.client.post_record(&token, &record).await?;

        tracing::debug!("Saved {} '{}' v{}", record.kind(), record.title, version);
        self.local_mut().insert(record);
        Ok(version)
    }

    /// Deletes a title on the server, then locally.
    ///
    /// Only titles present in the local vault are deleted.
    pub async fn delete(&mut self, kind: Kind, title: &str) -> Result<DeleteOutcome, DriverError> {
        if self.local().and_then(|v| v.get(kind, title)).is_none() {
            return Ok(DeleteOutcome::NotFoundLocally);
        }

        let token = self.token()?;
        self.client.delete_record(&token, kind, title).await?;

        self.local_mut().remove(kind, title);
        Ok(DeleteOutcome::Deleted)
    }

    /// Locally held records, optionally of one kind, ordered by kind then title.
    pub fn list(&self, kind: Option<Kind>) -> Vec<&Record> {
        let Some(vault) = self.local() else {
            return Vec::new();
        };
        let kinds: Vec<Kind> = match kind {
            Some(kind) => vec![kind],
            None => Kind::ALL.to_vec(),
        };
        kinds
            .into_iter()
            .flat_map(|kind| vault.kind_map(kind).values())
            .collect()
    }

    fn token(&self) -> Result<String, DriverError> {
        self.session
            .token(&self.profile)
            .map(str::to_string)
            .ok_or_else(|| DriverError::NotAuthenticated(self.profile.clone()))
    }

    fn local(&self) -> Option<&Vault> {
        self.session.vault(&self.profile)
    }

    fn local_mut(&mut self) -> &mut Vault {
        self.session.vault_or_default(&self.profile)
    }

    fn merge_remote(&mut self, remote: &Vault) -> MergeReport {
        let (merged, report) = combine_with_report(self.local(), Some(remote));
        self.session.set_vault(&self.profile, merged);
        report
    }
}
