use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::kind::Kind;
use super::record::Record;

/// One user's records, keyed by title within each kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vault {
    #[serde(default)]
    pub pair: BTreeMap<String, Record>,
    #[serde(default)]
    pub text: BTreeMap<String, Record>,
    #[serde(default)]
    pub bin: BTreeMap<String, Record>,
    #[serde(default)]
    pub card: BTreeMap<String, Record>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind_map(&self, kind: Kind) -> &BTreeMap<String, Record> {
        match kind {
            Kind::Pair => &self.pair,
            Kind::Text => &self.text,
            Kind::Bin => &self.bin,
            Kind::Card => &self.card,
        }
    }

    pub fn kind_map_mut(&mut self, kind: Kind) -> &mut BTreeMap<String, Record> {
        match kind {
            Kind::Pair => &mut self.pair,
            Kind::Text => &mut self.text,
            Kind::Bin => &mut self.bin,
            Kind::Card => &mut self.card,
        }
    }

    pub fn get(&self, kind: Kind, title: &str) -> Option<&Record> {
        self.kind_map(kind).get(title)
    }

    /// Files the record under its payload kind, replacing any record with
    /// the same title.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.kind_map_mut(record.kind())
            .insert(record.title.clone(), record)
    }

    pub fn remove(&mut self, kind: Kind, title: &str) -> Option<Record> {
        self.kind_map_mut(kind).remove(title)
    }

    pub fn titles(&self, kind: Kind) -> impl Iterator<Item = &str> {
        self.kind_map(kind).keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        Kind::ALL.iter().map(|k| self.kind_map(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The server's view of a vault: the latest live version of every title,
/// as flat lists per kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub pairs: Vec<Record>,
    #[serde(default)]
    pub texts: Vec<Record>,
    #[serde(default)]
    pub bins: Vec<Record>,
    #[serde(default)]
    pub cards: Vec<Record>,
}

impl Snapshot {
    /// Appends a record to the list matching its payload kind.
    pub fn push(&mut self, record: Record) {
        match record.kind() {
            Kind::Pair => self.pairs.push(record),
            Kind::Text => self.texts.push(record),
            Kind::Bin => self.bins.push(record),
            Kind::Card => self.cards.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len() + self.texts.len() + self.bins.len() + self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Snapshot> for Vault {
    fn from(snapshot: Snapshot) -> Self {
        let mut vault = Vault::new();
        let records = snapshot
            .pairs
            .into_iter()
            .chain(snapshot.texts)
            .chain(snapshot.bins)
            .chain(snapshot.cards);

        for record in records {
            // A title listed twice keeps its highest version.
            let newer = vault
                .get(record.kind(), &record.title)
                .map_or(true, |existing| record.version > existing.version);
            if newer {
                vault.insert(record);
            }
        }
        vault
    }
}

impl From<&Vault> for Snapshot {
    fn from(vault: &Vault) -> Self {
        let mut snapshot = Snapshot::default();
        for kind in Kind::ALL {
            for record in vault.kind_map(kind).values() {
                snapshot.push(record.clone());
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;

    fn text(title: &str, body: &str, version: u32) -> Record {
        Record::new(
            title,
            Payload::Text {
                body: body.to_string(),
            },
        )
        .with_version(version)
    }

    fn card(title: &str, version: u32) -> Record {
        Record::new(
            title,
            Payload::Card {
                number: "4111111111111111".to_string(),
                expdate: "01/29".to_string(),
            },
        )
        .with_version(version)
    }

    #[test]
    fn test_insert_files_by_payload_kind() {
        let mut vault = Vault::new();
        vault.insert(text("note", "hello", 1));
        vault.insert(card("visa", 1));

        assert_eq!(vault.text.len(), 1);
        assert_eq!(vault.card.len(), 1);
        assert!(vault.get(Kind::Text, "note").is_some());
        assert!(vault.get(Kind::Pair, "note").is_none());
        assert_eq!(vault.len(), 2);
    }

    #[test]
    fn test_same_title_in_different_kinds_is_independent() {
        let mut vault = Vault::new();
        vault.insert(text("bank", "pin hint", 1));
        vault.insert(card("bank", 4));

        assert_eq!(vault.get(Kind::Text, "bank").unwrap().version, 1);
        assert_eq!(vault.get(Kind::Card, "bank").unwrap().version, 4);

        vault.remove(Kind::Text, "bank");
        assert!(vault.get(Kind::Card, "bank").is_some());
    }

    #[test]
    fn test_titles_are_sorted() {
        let mut vault = Vault::new();
        vault.insert(text("zeta", "z", 1));
        vault.insert(text("alpha", "a", 1));

        let titles: Vec<&str> = vault.titles(Kind::Text).collect();
        assert_eq!(titles, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_snapshot_into_vault() {
        let mut snapshot = Snapshot::default();
        snapshot.push(text("note", "a", 1));
        snapshot.push(card("visa", 2));

        let vault = Vault::from(snapshot);
        assert_eq!(vault.len(), 2);
        assert_eq!(vault.get(Kind::Card, "visa").unwrap().version, 2);
    }

    #[test]
    fn test_snapshot_refiles_misplaced_records() {
        let snapshot = Snapshot {
            pairs: vec![text("note", "misfiled", 1)],
            ..Default::default()
        };

        let vault = Vault::from(snapshot);
        assert!(vault.pair.is_empty());
        assert!(vault.get(Kind::Text, "note").is_some());
    }

    #[test]
    fn test_snapshot_duplicate_title_keeps_highest_version() {
        let snapshot = Snapshot {
            texts: vec![text("note", "new", 5), text("note", "old", 2)],
            ..Default::default()
        };

        let vault = Vault::from(snapshot);
        let note = vault.get(Kind::Text, "note").unwrap();
        assert_eq!(note.version, 5);
        assert_eq!(
            note.payload,
            Payload::Text {
                body: "new".to_string()
            }
        );
    }

    #[test]
    fn test_vault_to_snapshot_and_back() {
        let mut vault = Vault::new();
        vault.insert(text("note", "a", 1));
        vault.insert(card("visa", 3));

        let snapshot = Snapshot::from(&vault);
        assert_eq!(snapshot.texts.len(), 1);
        assert_eq!(snapshot.cards.len(), 1);
        assert_eq!(Vault::from(snapshot), vault);
    }

    #[test]
    fn test_vault_json_tolerates_missing_kinds() {
        let vault: Vault = serde_json::from_str("{}").unwrap();
        assert!(vault.is_empty());
    }
}
