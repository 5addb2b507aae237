//! Support levels
//!
//! A discrete label set describing how well a feature works under the
//! synthetic browser. The integer values are part of the overlay wire
//! format consumed by the documentation site, so they must not be renumbered.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CompatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Support {
    /// Nobody has looked yet. Identity element for sparse trimming.
    #[default]
    Unknown = 0,
    /// Tested, no known issues
    Tested = 1,
    /// Expected to work, not tested
    Expected = 2,
    /// Tested, has bugs or caveats
    Partial = 3,
    /// Not yet implemented
    Todo = 4,
    /// Cannot be implemented due to a technical limitation
    Never = 5,
}

impl Support {
    pub const ALL: [Support; 6] = [
        Support::Unknown,
        Support::Tested,
        Support::Expected,
        Support::Partial,
        Support::Todo,
        Support::Never,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Support::Unknown => "unknown",
            Support::Tested => "tested",
            Support::Expected => "expected",
            Support::Partial => "partial",
            Support::Todo => "todo",
            Support::Never => "never",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Levels under which the feature is considered working for the user.
    pub fn is_working(self) -> bool {
        matches!(self, Support::Tested | Support::Expected)
    }

    /// Human-readable status sentence for notes, e.g.
    /// "Expected to work, but not tested under Surfly."
    pub fn status_note(self, product: &str) -> String {
        match self {
            Support::Unknown => format!("Support under {product} is unknown."),
            Support::Tested => format!("Tested under {product}."),
            Support::Expected => format!("Expected to work, but not tested under {product}."),
            Support::Partial => format!("Partially supported under {product}."),
            Support::Todo => format!("Not yet implemented under {product}."),
            Support::Never => {
                format!("Cannot be supported under {product} due to a technical limitation.")
            }
        }
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; `supported` is accepted as an older name for `tested`.
impl FromStr for Support {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Support::Unknown),
            "tested" | "supported" => Ok(Support::Tested),
            "expected" => Ok(Support::Expected),
            "partial" => Ok(Support::Partial),
            "todo" => Ok(Support::Todo),
            "never" => Ok(Support::Never),
            _ => Err(CompatError::InvalidSupport(s.to_string())),
        }
    }
}

impl Serialize for Support {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Support {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Support::from_u8(value)
            .ok_or_else(|| de::Error::custom(format!("support level out of range: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("NEVER".parse::<Support>().unwrap(), Support::Never);
        assert_eq!("Expected".parse::<Support>().unwrap(), Support::Expected);
        assert_eq!(" todo ".parse::<Support>().unwrap(), Support::Todo);
    }

    #[test]
    fn test_parse_supported_alias() {
        assert_eq!("supported".parse::<Support>().unwrap(), Support::Tested);
    }

    #[test]
    fn test_parse_rejects_unknown_name() {
        let err = "mostly".parse::<Support>().unwrap_err();
        assert!(matches!(err, CompatError::InvalidSupport(ref s) if s == "mostly"));
    }

    #[test]
    fn test_wire_values_are_stable() {
        let values: Vec<u8> = Support::ALL.iter().map(|s| s.as_u8()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(serde_json::to_string(&Support::Partial).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Support>("5").unwrap(), Support::Never);
        assert!(serde_json::from_str::<Support>("6").is_err());
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Support::default(), Support::Unknown);
    }

    #[test]
    fn test_status_note_names_product() {
        assert_eq!(
            Support::Never.status_note("Surfly"),
            "Cannot be supported under Surfly due to a technical limitation."
        );
    }
}
