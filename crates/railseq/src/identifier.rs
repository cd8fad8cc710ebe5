use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cadence::ResetCadence;
use crate::config::IdentifierConfig;

/// The human-readable string assigned to a failure record, e.g.
/// `RF-2025-0042`.
///
/// An identifier is composed exactly once, when its record is created, and
/// is immutable and unique for the lifetime of that record. Reconfiguring
/// the prefix, padding, or cadence shapes future identifiers only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Renders the identifier for a given settings snapshot, allocation
    /// date, and sequence number.
    ///
    /// The cadence decides which date components appear:
    ///
    /// - [`Yearly`]: `{prefix}-{YYYY}-{sequence}`
    /// - [`Monthly`]: `{prefix}-{YYYY}-{MM}-{sequence}`
    /// - [`Never`]: `{prefix}-{sequence}`
    ///
    /// The sequence is zero-padded to `padding_width` digits; larger
    /// sequences keep all their digits.
    ///
    /// [`Yearly`]: ResetCadence::Yearly
    /// [`Monthly`]: ResetCadence::Monthly
    /// [`Never`]: ResetCadence::Never
    pub fn compose(config: &IdentifierConfig, on: NaiveDate, sequence: u64) -> Self {
        let width = config.padding_width as usize;
        let rendered = match config.reset_cadence {
            ResetCadence::Yearly => {
                format!("{}-{:04}-{:0width$}", config.prefix, on.year(), sequence)
            }
            ResetCadence::Monthly => format!(
                "{}-{:04}-{:02}-{:0width$}",
                config.prefix,
                on.year(),
                on.month(),
                sequence
            ),
            ResetCadence::Never => format!("{}-{:0width$}", config.prefix, sequence),
        };
        Self(rendered)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Wraps an identifier string previously issued by the allocator, e.g. one
/// read back from a record store.
impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cadence: ResetCadence) -> IdentifierConfig {
        IdentifierConfig {
            prefix: "RF".to_string(),
            padding_width: 4,
            reset_cadence: cadence,
        }
    }

    fn mid_2025() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn yearly_format() {
        let id = Identifier::compose(&config(ResetCadence::Yearly), mid_2025(), 42);
        assert_eq!(id.as_str(), "RF-2025-0042");
    }

    #[test]
    fn monthly_format() {
        let id = Identifier::compose(&config(ResetCadence::Monthly), mid_2025(), 42);
        assert_eq!(id.as_str(), "RF-2025-06-0042");
    }

    #[test]
    fn never_format() {
        let id = Identifier::compose(&config(ResetCadence::Never), mid_2025(), 42);
        assert_eq!(id.as_str(), "RF-0042");
    }

    #[test]
    fn sequence_wider_than_padding_is_not_truncated() {
        let id = Identifier::compose(&config(ResetCadence::Yearly), mid_2025(), 10_000);
        assert_eq!(id.as_str(), "RF-2025-10000");
    }

    #[test]
    fn padding_width_one_leaves_small_sequences_bare() {
        let mut config = config(ResetCadence::Never);
        config.padding_width = 1;
        let id = Identifier::compose(&config, mid_2025(), 7);
        assert_eq!(id.as_str(), "RF-7");
    }

    #[test]
    fn month_is_always_two_digits() {
        let january = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let id = Identifier::compose(&config(ResetCadence::Monthly), january, 1);
        assert_eq!(id.as_str(), "RF-2025-01-0001");
    }

    #[test]
    fn serde_is_transparent() {
        let id = Identifier::from("RF-2025-0042".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"RF-2025-0042\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
