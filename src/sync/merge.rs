use std::collections::BTreeSet;
use std::fmt;

use super::resolve::resolve;
use crate::models::{Kind, Vault};

/// Where each title of a merged vault came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Titles whose winner was the local copy.
    pub from_local: usize,
    /// Titles whose winner was the remote copy and differed from local.
    pub from_remote: usize,
    /// Titles held identically on both sides.
    pub unchanged: usize,
}

impl MergeReport {
    pub fn total(&self) -> usize {
        self.from_local + self.from_remote + self.unchanged
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} from server, {} kept local, {} unchanged",
            self.total(),
            self.from_remote,
            self.from_local,
            self.unchanged
        )
    }
}

/// Reconciles two vaults title by title. A missing vault counts as empty.
///
/// The result holds exactly the union of titles per kind. Where both sides
/// hold a title, [`resolve`] picks the winner, so equal versions go to
/// `remote` and the operation is not symmetric on ties.
pub fn combine(local: Option<&Vault>, remote: Option<&Vault>) -> Vault {
    combine_with_report(local, remote).0
}

/// Same as [`combine`], also counting where each winner came from.
pub fn combine_with_report(local: Option<&Vault>, remote: Option<&Vault>) -> (Vault, MergeReport) {
    let empty = Vault::new();
    let local = local.unwrap_or(&empty);
    let remote = remote.unwrap_or(&empty);

    let mut merged = Vault::new();
    let mut report = MergeReport::default();

    for kind in Kind::ALL {
        let ours = local.kind_map(kind);
        let theirs = remote.kind_map(kind);
        let titles: BTreeSet<&String> = ours.keys().chain(theirs.keys()).collect();

        let target = merged.kind_map_mut(kind);
        for title in titles {
            let mine = ours.get(title);
            let other = theirs.get(title);
            let Some(winner) = resolve(mine, other) else {
                continue;
            };

            match (mine, other) {
                (Some(a), Some(b)) if a == b => report.unchanged += 1,
                (Some(a), _) if std::ptr::eq(a, winner) => report.from_local += 1,
                _ => report.from_remote += 1,
            }
            target.insert(title.clone(), winner.clone());
        }
    }

    (merged, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payload, Record};

    fn pair(title: &str, pass: &str, version: u32) -> Record {
        Record::new(
            title,
            Payload::Pair {
                login: "alice".to_string(),
                pass: pass.to_string(),
            },
        )
        .with_version(version)
    }

    fn text(title: &str, body: &str, version: u32) -> Record {
        Record::new(
            title,
            Payload::Text {
                body: body.to_string(),
            },
        )
        .with_version(version)
    }

    fn bin(title: &str, version: u32) -> Record {
        Record::new(title, Payload::Bin { body: vec![7; 4] }).with_version(version)
    }

    fn vault(records: Vec<Record>) -> Vault {
        let mut vault = Vault::new();
        for record in records {
            vault.insert(record);
        }
        vault
    }

    fn titles(vault: &Vault, kind: Kind) -> Vec<String> {
        vault.titles(kind).map(str::to_string).collect()
    }

    #[test]
    fn test_result_is_union_of_titles_per_kind() {
        let local = vault(vec![pair("mail", "a", 1), text("todo", "x", 1)]);
        let remote = vault(vec![pair("bank", "b", 1), text("todo", "y", 2), bin("key", 1)]);

        let merged = combine(Some(&local), Some(&remote));

        assert_eq!(titles(&merged, Kind::Pair), vec!["bank", "mail"]);
        assert_eq!(titles(&merged, Kind::Text), vec!["todo"]);
        assert_eq!(titles(&merged, Kind::Bin), vec!["key"]);
        assert!(merged.card.is_empty());
    }

    #[test]
    fn test_newer_version_wins_from_either_side() {
        let local = vault(vec![pair("mail", "local-new", 3), pair("bank", "local-old", 1)]);
        let remote = vault(vec![pair("mail", "remote-old", 2), pair("bank", "remote-new", 5)]);

        let merged = combine(Some(&local), Some(&remote));

        assert_eq!(merged.get(Kind::Pair, "mail").unwrap().version, 3);
        assert_eq!(merged.get(Kind::Pair, "bank").unwrap().version, 5);
    }

    #[test]
    fn test_tie_prefers_remote_and_is_order_dependent() {
        let local = vault(vec![text("todo", "local", 2)]);
        let remote = vault(vec![text("todo", "remote", 2)]);

        let forward = combine(Some(&local), Some(&remote));
        let backward = combine(Some(&remote), Some(&local));

        assert_eq!(forward.get(Kind::Text, "todo"), remote.get(Kind::Text, "todo"));
        assert_eq!(backward.get(Kind::Text, "todo"), local.get(Kind::Text, "todo"));
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_commutative_without_ties() {
        let a = vault(vec![pair("mail", "a", 1), text("todo", "a", 4)]);
        let b = vault(vec![pair("mail", "b", 2), bin("key", 1)]);

        assert_eq!(combine(Some(&a), Some(&b)), combine(Some(&b), Some(&a)));
    }

    #[test]
    fn test_missing_vault_is_identity() {
        let v = vault(vec![pair("mail", "a", 1), bin("key", 3)]);

        assert_eq!(combine(None, Some(&v)), v);
        assert_eq!(combine(Some(&v), None), v);
        assert!(combine(None, None).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let v = vault(vec![pair("mail", "a", 1), text("todo", "x", 2), bin("key", 3)]);
        assert_eq!(combine(Some(&v), Some(&v)), v);
    }

    #[test]
    fn test_same_title_across_kinds_merges_independently() {
        let local = vault(vec![text("bank", "note", 9)]);
        let remote = vault(vec![pair("bank", "secret", 1)]);

        let merged = combine(Some(&local), Some(&remote));

        assert_eq!(merged.get(Kind::Text, "bank").unwrap().version, 9);
        assert_eq!(merged.get(Kind::Pair, "bank").unwrap().version, 1);
    }

    #[test]
    fn test_report_counts_sources() {
        let local = vault(vec![
            pair("mail", "same", 1),
            pair("bank", "local-new", 4),
            text("draft", "only local", 1),
        ]);
        let remote = vault(vec![
            pair("mail", "same", 1),
            pair("bank", "remote-old", 2),
            text("todo", "only remote", 1),
            bin("key", 1),
        ]);

        let (merged, report) = combine_with_report(Some(&local), Some(&remote));

        assert_eq!(merged.len(), 5);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.from_local, 2);
        assert_eq!(report.from_remote, 2);
        assert_eq!(report.total(), merged.len());
    }

    #[test]
    fn test_report_tie_with_different_contents_counts_as_remote() {
        let local = vault(vec![text("todo", "local", 2)]);
        let remote = vault(vec![text("todo", "remote", 2)]);

        let (_, report) = combine_with_report(Some(&local), Some(&remote));

        assert_eq!(report.from_remote, 1);
        assert_eq!(report.from_local, 0);
    }
}
