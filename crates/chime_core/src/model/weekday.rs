//! Canonical weekday vocabulary.
//!
//! # Responsibility
//! - Provide a fixed, locale-independent weekday enumeration for day
//!   matching.
//! - Own the comma-joined token codec used by bell storage.
//!
//! # Invariants
//! - Tokens are the fixed English day names `Monday..Sunday`; they never
//!   come from locale-dependent formatting.
//! - Decoded sets are deduplicated; encoding order is the enum order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Day of week used for bell day matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the canonical storage/matching token for this day.
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Parses one canonical token. Exact match only, no locale aliases.
    pub fn parse_token(value: &str) -> Option<Self> {
        match value {
            "Monday" => Some(Self::Monday),
            "Tuesday" => Some(Self::Tuesday),
            "Wednesday" => Some(Self::Wednesday),
            "Thursday" => Some(Self::Thursday),
            "Friday" => Some(Self::Friday),
            "Saturday" => Some(Self::Saturday),
            "Sunday" => Some(Self::Sunday),
            _ => None,
        }
    }

    /// Maps the chrono weekday onto the canonical vocabulary.
    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Encodes a weekday set as the comma-joined storage form.
///
/// The empty set encodes as an empty string; such a bell never fires.
pub fn encode_weekdays(days: &BTreeSet<Weekday>) -> String {
    days.iter()
        .map(|day| day.as_token())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decodes a comma-joined weekday string into a deduplicated set.
///
/// Blank segments are skipped so `""` and `"Monday,,Tuesday"` both decode.
/// Returns the offending token when a segment is not canonical.
pub fn decode_weekdays(value: &str) -> Result<BTreeSet<Weekday>, String> {
    let mut days = BTreeSet::new();
    for segment in value.split(',') {
        let token = segment.trim();
        if token.is_empty() {
            continue;
        }
        match Weekday::parse_token(token) {
            Some(day) => {
                days.insert(day);
            }
            None => return Err(token.to_string()),
        }
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::{decode_weekdays, encode_weekdays, Weekday};
    use std::collections::BTreeSet;

    #[test]
    fn tokens_round_trip() {
        for day in [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
            Weekday::Sunday,
        ] {
            assert_eq!(Weekday::parse_token(day.as_token()), Some(day));
        }
    }

    #[test]
    fn parse_token_rejects_non_canonical_spellings() {
        assert_eq!(Weekday::parse_token("monday"), None);
        assert_eq!(Weekday::parse_token("Mon"), None);
        assert_eq!(Weekday::parse_token(""), None);
    }

    #[test]
    fn encode_is_order_independent() {
        let mut days = BTreeSet::new();
        days.insert(Weekday::Friday);
        days.insert(Weekday::Monday);
        assert_eq!(encode_weekdays(&days), "Monday,Friday");
    }

    #[test]
    fn decode_skips_blank_segments_and_deduplicates() {
        let days = decode_weekdays("Monday,,Monday, Tuesday ,").unwrap();
        assert_eq!(days.len(), 2);
        assert!(days.contains(&Weekday::Monday));
        assert!(days.contains(&Weekday::Tuesday));
    }

    #[test]
    fn decode_empty_string_is_empty_set() {
        assert!(decode_weekdays("").unwrap().is_empty());
    }

    #[test]
    fn decode_reports_offending_token() {
        let err = decode_weekdays("Monday,Funday").unwrap_err();
        assert_eq!(err, "Funday");
    }
}
