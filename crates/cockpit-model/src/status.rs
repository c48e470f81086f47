//! Status severity order
//!
//! Statuses form a fixed total order, lowest to highest:
//! ok, information, inherited, disconnected, minor, critical, fatal.
//! Linked entities merge statuses by keeping the most severe one.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity-ordered status of an element, sub-element or map point
///
/// Variant declaration order is the severity order, so the derived `Ord`
/// compares by severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Status {
    /// Nominal
    #[default]
    #[serde(rename = "ok")]
    Ok,
    /// Informational notice
    #[serde(rename = "information", alias = "info")]
    Information,
    /// Inherits the domain's status
    #[serde(rename = "heritage", alias = "inherited", alias = "herite_domaine")]
    Inherited,
    /// Source not reachable
    #[serde(rename = "deconnecte", alias = "disconnected")]
    Disconnected,
    /// Minor incident
    #[serde(rename = "mineur", alias = "minor")]
    Minor,
    /// Critical incident
    #[serde(rename = "critique", alias = "critical")]
    Critical,
    /// Fatal incident
    #[serde(rename = "fatal")]
    Fatal,
}

impl Status {
    /// Every status, lowest severity first
    pub const ALL: [Status; 7] = [
        Status::Ok,
        Status::Information,
        Status::Inherited,
        Status::Disconnected,
        Status::Minor,
        Status::Critical,
        Status::Fatal,
    ];

    /// Severity rank (0 = ok, 6 = fatal)
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Information => 1,
            Status::Inherited => 2,
            Status::Disconnected => 3,
            Status::Minor => 4,
            Status::Critical => 5,
            Status::Fatal => 6,
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Information => "information",
            Status::Inherited => "heritage",
            Status::Disconnected => "deconnecte",
            Status::Minor => "mineur",
            Status::Critical => "critique",
            Status::Fatal => "fatal",
        }
    }
}

/// Return whichever status is more severe; ties keep `a`.
#[inline]
#[must_use]
pub fn most_critical_status(a: Status, b: Status) -> Status {
    if b.rank() > a.rank() {
        b
    } else {
        a
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Ok(Status::Ok),
            "information" | "info" => Ok(Status::Information),
            "heritage" | "inherited" | "herite_domaine" => Ok(Status::Inherited),
            "deconnecte" | "disconnected" => Ok(Status::Disconnected),
            "mineur" | "minor" => Ok(Status::Minor),
            "critique" | "critical" => Ok(Status::Critical),
            "fatal" => Ok(Status::Fatal),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = Status> {
        prop::sample::select(Status::ALL.to_vec())
    }

    #[test]
    fn ord_matches_rank() {
        for pair in Status::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn tie_keeps_first_argument() {
        assert_eq!(most_critical_status(Status::Minor, Status::Minor), Status::Minor);
    }

    #[test]
    fn wire_names_round_trip() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn english_aliases_are_accepted() {
        let s: Status = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(s, Status::Critical);
        assert_eq!("Disconnected".parse::<Status>().unwrap(), Status::Disconnected);
        assert!("bogus".parse::<Status>().is_err());
    }

    proptest! {
        #[test]
        fn merge_never_drops_severity(a in any_status(), b in any_status()) {
            let merged = most_critical_status(a, b);
            prop_assert!(merged.rank() >= a.rank().max(b.rank()));
        }

        #[test]
        fn merge_is_symmetric_when_severities_differ(a in any_status(), b in any_status()) {
            prop_assume!(a != b);
            prop_assert_eq!(most_critical_status(a, b), most_critical_status(b, a));
        }
    }
}
