//! Faction identifiers
//!
//! The faction set is a closed enumeration shared between client and server.
//! Wire ids are the lowercase strings the client sends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A playable faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Monsters,
    Nilfgaard,
    Northern,
    Scoiatael,
    Skellige,
    Syndicate,
}

impl Faction {
    /// All factions, in declaration order
    ///
    /// Declaration order is also the padding order used by selection-timeout
    /// auto-fill, so it must stay stable.
    pub const ALL: [Faction; 6] = [
        Faction::Monsters,
        Faction::Nilfgaard,
        Faction::Northern,
        Faction::Scoiatael,
        Faction::Skellige,
        Faction::Syndicate,
    ];

    /// Convert to the wire/JSON string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monsters => "monsters",
            Self::Nilfgaard => "nilfgaard",
            Self::Northern => "northern",
            Self::Scoiatael => "scoiatael",
            Self::Skellige => "skellige",
            Self::Syndicate => "syndicate",
        }
    }

    /// Parse from the wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monsters" => Some(Self::Monsters),
            "nilfgaard" => Some(Self::Nilfgaard),
            "northern" => Some(Self::Northern),
            "scoiatael" => Some(Self::Scoiatael),
            "skellige" => Some(Self::Skellige),
            "syndicate" => Some(Self::Syndicate),
            _ => None,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
