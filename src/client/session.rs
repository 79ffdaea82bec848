//! Client-side state: bearer credentials and vault mirrors per profile.
//!
//! Loaded once at startup and written back after a command succeeds:
//! ```text
//! <DATA_DIR>/
//!   credentials.json   profile -> token
//!   vaults.json        profile -> vault
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::models::Vault;

const CREDENTIALS_FILE: &str = "credentials.json";
const VAULTS_FILE: &str = "vaults.json";

#[derive(Debug)]
pub enum SessionError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// A state file exists but is not valid JSON for its shape.
    ParseError(PathBuf, serde_json::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::IoError(path, e) => write!(f, "I/O error for {}: {}", path.display(), e),
            SessionError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    credentials: BTreeMap<String, String>,
    vaults: BTreeMap<String, Vault>,
}

impl Session {
    /// Reads session state from `dir`. Missing files mean empty state.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        let credentials = read_json(&dir.join(CREDENTIALS_FILE))?;
        let vaults = read_json(&dir.join(VAULTS_FILE))?;
        Ok(Self {
            dir,
            credentials,
            vaults,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn token(&self, profile: &str) -> Option<&str> {
        self.credentials.get(profile).map(String::as_str)
    }

    pub fn set_token(&mut self, profile: &str, token: String) {
        self.credentials.insert(profile.to_string(), token);
    }

    pub fn vault(&self, profile: &str) -> Option<&Vault> {
        self.vaults.get(profile)
    }

    pub fn vault_mut(&mut self, profile: &str) -> Option<&mut Vault> {
        self.vaults.get_mut(profile)
    }

    /// The profile's vault, created empty if the profile has none yet.
    pub fn vault_or_default(&mut self, profile: &str) -> &mut Vault {
        self.vaults.entry(profile.to_string()).or_default()
    }

    pub fn set_vault(&mut self, profile: &str, vault: Vault) {
        self.vaults.insert(profile.to_string(), vault);
    }

    /// Writes both state files atomically.
    pub fn persist(&self) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir).map_err(|e| SessionError::IoError(self.dir.clone(), e))?;
        write_json(&self.dir.join(CREDENTIALS_FILE), &self.credentials)?;
        write_json(&self.dir.join(VAULTS_FILE), &self.vaults)?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, SessionError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(T::default()),
        Ok(bytes) => {
            serde_json::from_slice(&bytes).map_err(|e| SessionError::ParseError(path.into(), e))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(SessionError::IoError(path.into(), e)),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SessionError> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| SessionError::ParseError(path.into(), e))?;
    let temp_path = path.with_extension("json.tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| SessionError::IoError(temp_path.clone(), e))?;
    restrict_permissions(&file).map_err(|e| SessionError::IoError(temp_path.clone(), e))?;
    file.write_all(&bytes)
        .map_err(|e| SessionError::IoError(temp_path.clone(), e))?;
    file.sync_all()
        .map_err(|e| SessionError::IoError(temp_path.clone(), e))?;

    fs::rename(&temp_path, path).map_err(|e| SessionError::IoError(path.into(), e))?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Kind, Payload, Record};
    use tempfile::TempDir;

    fn note(title: &str, version: u32) -> Record {
        Record::new(
            title,
            Payload::Text {
                body: "remember the milk".to_string(),
            },
        )
        .with_version(version)
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::load(temp_dir.path().join("absent")).unwrap();

        assert!(session.token("alice").is_none());
        assert!(session.vault("alice").is_none());
    }

    #[test]
    fn test_persist_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("keeper");

        let mut session = Session::load(&dir).unwrap();
        session.set_token("alice", "tok-a".to_string());
        let mut vault = Vault::new();
        vault.insert(note("todo", 3));
        session.set_vault("alice", vault.clone());
        session.persist().unwrap();

        let reloaded = Session::load(&dir).unwrap();
        assert_eq!(reloaded.token("alice"), Some("tok-a"));
        assert_eq!(reloaded.vault("alice"), Some(&vault));
        assert!(!dir.join("vaults.json.tmp").exists());
    }

    #[test]
    fn test_profiles_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = Session::load(temp_dir.path()).unwrap();

        session.set_token("alice", "a".to_string());
        session.set_token("bob", "b".to_string());
        session.set_vault("alice", Vault::new());
        session
            .vault_mut("alice")
            .unwrap()
            .insert(note("todo", 1));

        assert_eq!(session.token("bob"), Some("b"));
        assert!(session.vault("bob").is_none());
        assert!(session.vault("alice").unwrap().get(Kind::Text, "todo").is_some());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(VAULTS_FILE), "{not json").unwrap();

        let err = Session::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, SessionError::ParseError(_, _)));
    }

    #[cfg(unix)]
    #[test]
    fn test_state_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let mut session = Session::load(temp_dir.path()).unwrap();
        session.set_token("alice", "a".to_string());
        session.persist().unwrap();

        let mode = fs::metadata(temp_dir.path().join(CREDENTIALS_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
