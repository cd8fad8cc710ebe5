use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The period after which the sequence counter returns to zero.
///
/// The cadence only takes effect as a side effect of allocation: there is no
/// timer that resets the counter at midnight. The first allocation whose date
/// falls in a new window performs the reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetCadence {
    /// Reset when the calendar year changes.
    #[default]
    Yearly,
    /// Reset when the calendar month (or year) changes.
    Monthly,
    /// Never reset; the sequence grows without bound.
    Never,
}

impl ResetCadence {
    /// Returns true when `today` falls in a different cadence window than
    /// the window `last_reset_on` was recorded in.
    ///
    /// Note the comparison is against whatever date the last reset stamped,
    /// even if the cadence has been reconfigured since. A cadence change
    /// mid-window can therefore trigger an immediate reset on the next
    /// allocation; that is accepted behavior, not repaired here.
    pub fn window_changed(self, last_reset_on: NaiveDate, today: NaiveDate) -> bool {
        match self {
            ResetCadence::Yearly => today.year() != last_reset_on.year(),
            ResetCadence::Monthly => {
                today.year() != last_reset_on.year() || today.month() != last_reset_on.month()
            }
            ResetCadence::Never => false,
        }
    }

    /// Stable text form used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            ResetCadence::Yearly => "yearly",
            ResetCadence::Monthly => "monthly",
            ResetCadence::Never => "never",
        }
    }
}

impl fmt::Display for ResetCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetCadence {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yearly" => Ok(ResetCadence::Yearly),
            "monthly" => Ok(ResetCadence::Monthly),
            "never" => Ok(ResetCadence::Never),
            other => Err(ConfigError::UnknownCadence {
                value: other.to_string(),
            }),
        }
    }
}
