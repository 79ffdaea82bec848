use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four record kinds a vault holds.
///
/// Titles are unique per (user, kind), so every keyed operation takes a
/// `Kind` alongside the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Pair,
    Text,
    Bin,
    Card,
}

impl Kind {
    /// All kinds, in the order they are listed and merged.
    pub const ALL: [Kind; 4] = [Kind::Pair, Kind::Text, Kind::Bin, Kind::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Pair => "pair",
            Kind::Text => "text",
            Kind::Bin => "bin",
            Kind::Card => "card",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pair" => Ok(Kind::Pair),
            "text" => Ok(Kind::Text),
            "bin" | "binary" => Ok(Kind::Bin),
            "card" => Ok(Kind::Card),
            _ => Err(format!(
                "Invalid record kind '{}'. Valid options: pair, text, bin, card",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", Kind::Pair), "pair");
        assert_eq!(format!("{}", Kind::Text), "text");
        assert_eq!(format!("{}", Kind::Bin), "bin");
        assert_eq!(format!("{}", Kind::Card), "card");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(Kind::from_str("pair").unwrap(), Kind::Pair);
        assert_eq!(Kind::from_str("TEXT").unwrap(), Kind::Text);
        assert_eq!(Kind::from_str("binary").unwrap(), Kind::Bin);
        assert_eq!(Kind::from_str("Card").unwrap(), Kind::Card);
    }

    #[test]
    fn test_kind_from_str_invalid() {
        assert!(Kind::from_str("note").is_err());
        assert!(Kind::from_str("").is_err());
    }

    #[test]
    fn test_kind_json_uses_lowercase_name() {
        let json = serde_json::to_string(&Kind::Bin).unwrap();
        assert_eq!(json, "\"bin\"");

        let parsed: Kind = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(parsed, Kind::Card);
    }

    #[test]
    fn test_all_covers_every_kind_once() {
        let mut kinds = Kind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), 4);
    }
}
