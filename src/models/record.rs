use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::kind::Kind;

/// Kind-specific contents of a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Payload {
    Pair {
        login: String,
        pass: String,
    },
    Text {
        body: String,
    },
    Bin {
        #[serde(with = "base64_body")]
        body: Vec<u8>,
    },
    Card {
        number: String,
        expdate: String,
    },
}

impl Payload {
    pub fn kind(&self) -> Kind {
        match self {
            Payload::Pair { .. } => Kind::Pair,
            Payload::Text { .. } => Kind::Text,
            Payload::Bin { .. } => Kind::Bin,
            Payload::Card { .. } => Kind::Card,
        }
    }
}

/// A versioned secret, keyed by title within its kind.
///
/// `version` is assigned by the writer (stored version + 1); the server only
/// gates on ordering. `deleted_at` is the soft-delete marker: a deleted
/// record keeps its title and history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(title: impl Into<String>, payload: Payload) -> Self {
        Self {
            title: title.into(),
            payload,
            comment: None,
            version: 0,
            deleted_at: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment.filter(|c| !c.is_empty());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        match &self.payload {
            Payload::Pair { login, pass } => {
                writeln!(f, "Login: {}", login)?;
                writeln!(f, "Password: {}", pass)?;
            }
            Payload::Text { body } => {
                writeln!(f, "Text: {}", body)?;
            }
            Payload::Bin { body } => {
                writeln!(f, "Body: {} bytes", body.len())?;
            }
            Payload::Card { number, expdate } => {
                writeln!(f, "Number: {}", number)?;
                writeln!(f, "Expires: {}", expdate)?;
            }
        }
        if let Some(comment) = &self.comment {
            writeln!(f, "Comment: {}", comment)?;
        }
        write!(f, "Version: {}", self.version)
    }
}

/// Binary bodies travel and persist as standard base64 strings.
mod base64_body {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
