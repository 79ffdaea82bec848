use crate::models::Record;

/// Picks the authoritative copy of one title held by both sides.
///
/// The strictly greater version wins. Equal versions go to `remote`, so the
/// server's copy is preferred whenever the two sides cannot be ordered.
pub fn resolve<'a>(local: Option<&'a Record>, remote: Option<&'a Record>) -> Option<&'a Record> {
    match (local, remote) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only),
        (Some(local), Some(remote)) => {
            if local.version > remote.version {
                Some(local)
            } else {
                Some(remote)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;

    fn note(body: &str, version: u32) -> Record {
        Record::new(
            "note",
            Payload::Text {
                body: body.to_string(),
            },
        )
        .with_version(version)
    }

    #[test]
    fn test_both_absent() {
        assert!(resolve(None, None).is_none());
    }

    #[test]
    fn test_only_one_present() {
        let local = note("local", 1);
        let remote = note("remote", 1);

        assert_eq!(resolve(Some(&local), None), Some(&local));
        assert_eq!(resolve(None, Some(&remote)), Some(&remote));
    }

    #[test]
    fn test_greater_version_wins() {
        let older = note("older", 2);
        let newer = note("newer", 3);

        assert_eq!(resolve(Some(&newer), Some(&older)), Some(&newer));
        assert_eq!(resolve(Some(&older), Some(&newer)), Some(&newer));
    }

    #[test]
    fn test_tie_goes_to_remote() {
        let local = note("local", 4);
        let remote = note("remote", 4);

        let winner = resolve(Some(&local), Some(&remote)).unwrap();
        assert_eq!(
            winner.payload,
            Payload::Text {
                body: "remote".to_string()
            }
        );

        // Swapping arguments swaps the winner.
        let winner = resolve(Some(&remote), Some(&local)).unwrap();
        assert_eq!(
            winner.payload,
            Payload::Text {
                body: "local".to_string()
            }
        );
    }
}
