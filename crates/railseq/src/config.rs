use serde::{Deserialize, Serialize};

use crate::cadence::ResetCadence;
use crate::error::{ConfigError, Result};

/// Longest accepted prefix, in characters.
pub const MAX_PREFIX_LEN: usize = 10;

/// Smallest accepted zero-padding width.
pub const MIN_PADDING_WIDTH: u32 = 1;

/// Widest accepted zero-padding width.
pub const MAX_PADDING_WIDTH: u32 = 16;

/// The administrator-editable identifier settings.
///
/// These three fields shape every identifier issued from the moment they are
/// written; identifiers already issued are never rewritten. The counter
/// fields that complete the persisted record live in [`CounterState`] and
/// are owned by the allocator alone.
///
/// [`CounterState`]: crate::CounterState
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierConfig {
    /// Leading tag of every identifier, e.g. `"RF"`.
    pub prefix: String,
    /// Number of digits the sequence is zero-padded to. Sequences needing
    /// more digits widen the string instead of truncating.
    pub padding_width: u32,
    /// When the sequence counter returns to zero.
    pub reset_cadence: ResetCadence,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            prefix: "RF".to_string(),
            padding_width: 4,
            reset_cadence: ResetCadence::Yearly,
        }
    }
}

impl IdentifierConfig {
    /// Checks the settings against the write-time rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_prefix(&self.prefix)?;
        validate_padding_width(self.padding_width)
    }
}

/// A partial update of the editable settings, as submitted through the
/// administration surface.
///
/// Carrying no counter fields at all is what keeps `last_sequence` and
/// `last_reset_on` out of reach of administrators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub prefix: Option<String>,
    pub padding_width: Option<u32>,
    pub reset_cadence: Option<ResetCadence>,
}

impl ConfigPatch {
    /// Rejects the patch before any store access when a provided field
    /// violates the write-time rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(prefix) = &self.prefix {
            validate_prefix(prefix)?;
        }
        if let Some(width) = self.padding_width {
            validate_padding_width(width)?;
        }
        Ok(())
    }

    /// Copies the provided fields onto `config`, leaving the rest untouched.
    pub fn apply_to(&self, config: &mut IdentifierConfig) {
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(width) = self.padding_width {
            config.padding_width = width;
        }
        if let Some(cadence) = self.reset_cadence {
            config.reset_cadence = cadence;
        }
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Err(ConfigError::EmptyPrefix);
    }
    let len = prefix.chars().count();
    if len > MAX_PREFIX_LEN {
        return Err(ConfigError::PrefixTooLong {
            len,
            max: MAX_PREFIX_LEN,
        });
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::PrefixNotAlphanumeric);
    }
    Ok(())
}

fn validate_padding_width(width: u32) -> Result<(), ConfigError> {
    if !(MIN_PADDING_WIDTH..=MAX_PADDING_WIDTH).contains(&width) {
        return Err(ConfigError::PaddingOutOfRange {
            width,
            min: MIN_PADDING_WIDTH,
            max: MAX_PADDING_WIDTH,
        });
    }
    Ok(())
}
