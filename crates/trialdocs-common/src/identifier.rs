//! ClinicalTrials.gov identifier normalisation.
//!
//! Every producer and consumer of trial identifiers (CSV rows, RIS records,
//! download directory names, HTTP requests) goes through [`TrialId::normalize`]
//! so that lookups across sources agree.
//!
//! ```
//! use trialdocs_common::TrialId;
//! assert_eq!(TrialId::normalize("nct4019").as_str(), "NCT00004019");
//! assert_eq!(TrialId::normalize(" NCT 4019 "), TrialId::normalize("NCT00004019"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Registry prefix shared by all normalised identifiers.
pub const REGISTRY_PREFIX: &str = "NCT";

/// Number of digits following the prefix.
pub const DIGIT_WIDTH: usize = 8;

/// A normalised trial registry identifier, always `NCT` followed by exactly eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct TrialId(String);

impl TrialId {
    /// Canonicalise any string into a trial identifier.
    ///
    /// Total: malformed input still produces a valid identifier. The prefix is
    /// removed case-insensitively (every occurrence), all non-digits are
    /// dropped, and the remaining digits are left-padded with zeros. Input with
    /// more than eight digits keeps its trailing eight.
    pub fn normalize(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        let digits: String = upper
            .replace(REGISTRY_PREFIX, "")
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();

        let digits = if digits.len() > DIGIT_WIDTH {
            &digits[digits.len() - DIGIT_WIDTH..]
        } else {
            digits.as_str()
        };

        TrialId(format!("{REGISTRY_PREFIX}{digits:0>width$}", width = DIGIT_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for TrialId {
    fn default() -> Self {
        TrialId::normalize("")
    }
}

impl From<&str> for TrialId {
    fn from(raw: &str) -> Self {
        TrialId::normalize(raw)
    }
}

impl From<String> for TrialId {
    fn from(raw: String) -> Self {
        TrialId::normalize(&raw)
    }
}

impl From<TrialId> for String {
    fn from(id: TrialId) -> Self {
        id.0
    }
}

impl AsRef<str> for TrialId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_canonical(s: &str) -> bool {
        s.len() == REGISTRY_PREFIX.len() + DIGIT_WIDTH
            && s.starts_with(REGISTRY_PREFIX)
            && s[REGISTRY_PREFIX.len()..].chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn test_case_whitespace_and_padding_agree() {
        let a = TrialId::normalize("nct4019");
        let b = TrialId::normalize("NCT 4019");
        let c = TrialId::normalize("nct00004019");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "NCT00004019");
    }

    #[test]
    fn test_repeated_prefix_is_removed() {
        assert_eq!(TrialId::normalize("NCTNCT125").as_str(), "NCT00000125");
        assert_eq!(TrialId::normalize("nCt-0412-5").as_str(), "NCT00004125");
    }

    #[test]
    fn test_no_digits_defaults_to_zero_fill() {
        assert_eq!(TrialId::normalize("").as_str(), "NCT00000000");
        assert_eq!(TrialId::normalize("not an id").as_str(), "NCT00000000");
        assert_eq!(TrialId::normalize("NaN").as_str(), "NCT00000000");
    }

    #[test]
    fn test_overlong_keeps_trailing_digits() {
        assert_eq!(TrialId::normalize("NCT0012345678").as_str(), "NCT12345678");
    }

    #[test]
    fn test_always_canonical_and_idempotent() {
        let inputs = [
            "", "NCT04956640", "nct 4956640", "  12  ", "NCT", "abcNCTdef9",
            "NCT123456789012", "ñçt 77", "NCT00000001\n", "id: NCT-0000-1234",
        ];
        for raw in inputs {
            let once = TrialId::normalize(raw);
            assert!(is_canonical(once.as_str()), "{raw:?} -> {once}");
            let twice = TrialId::normalize(once.as_str());
            assert_eq!(once, twice, "normalisation must be idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_serde_roundtrip_normalises() {
        let id: TrialId = serde_json::from_str("\"nct4019\"").unwrap();
        assert_eq!(id.as_str(), "NCT00004019");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"NCT00004019\"");
    }
}
