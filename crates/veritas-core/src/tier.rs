//! Severity tier codes assigned to a case.
//!
//! Tiers run from `S1` (low-risk, family or community repair) to `S3`
//! (high-stakes, long-form repair). Hints arriving from callers or from a
//! model response are free text, so parsing is lenient: surrounding
//! whitespace and letter case are ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    S1,
    S2,
    S3,
}

impl Tier {
    /// Tier used when no usable hint is available.
    pub const DEFAULT: Tier = Tier::S2;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
        }
    }

    /// Parse an optional hint, falling back to [`Tier::DEFAULT`].
    pub fn from_hint(hint: Option<&str>) -> Tier {
        hint.and_then(|h| h.parse().ok()).unwrap_or(Self::DEFAULT)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S1" => Ok(Self::S1),
            "S2" => Ok(Self::S2),
            "S3" => Ok(Self::S3),
            other => Err(format!("unknown tier: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_codes() {
        assert_eq!("S1".parse::<Tier>().unwrap(), Tier::S1);
        assert_eq!("S2".parse::<Tier>().unwrap(), Tier::S2);
        assert_eq!("S3".parse::<Tier>().unwrap(), Tier::S3);
    }

    #[test]
    fn lowercase_and_whitespace_normalised() {
        assert_eq!(" s3 ".parse::<Tier>().unwrap(), Tier::S3);
    }

    #[test]
    fn unknown_code_rejected() {
        assert!("S4".parse::<Tier>().is_err());
        assert!("".parse::<Tier>().is_err());
    }

    #[test]
    fn hint_falls_back_to_s2() {
        assert_eq!(Tier::from_hint(None), Tier::S2);
        assert_eq!(Tier::from_hint(Some("S9")), Tier::S2);
        assert_eq!(Tier::from_hint(Some("s1")), Tier::S1);
    }

    #[test]
    fn ordering_follows_severity() {
        assert!(Tier::S1 < Tier::S2);
        assert!(Tier::S2 < Tier::S3);
    }
}
