//! User-facing settings that gate machine-generated suggestions.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How many suggestions a single request may return: an integer in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "u8")]
pub struct SuggestionLimit(u8);

impl SuggestionLimit {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(limit: u8) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&limit) {
      Ok(Self(limit))
    } else {
      Err(Error::InvalidLimit(f64::from(limit)))
    }
  }

  /// Round `value` to the nearest integer, then range-check it.
  pub fn from_number(value: f64) -> Result<Self> {
    if !value.is_finite() {
      return Err(Error::InvalidLimit(value));
    }
    let rounded = value.round();
    if rounded < f64::from(Self::MIN) || rounded > f64::from(Self::MAX) {
      return Err(Error::InvalidLimit(value));
    }
    Ok(Self(rounded as u8))
  }

  pub fn get(self) -> usize { usize::from(self.0) }
}

impl Default for SuggestionLimit {
  fn default() -> Self { Self(2) }
}

impl TryFrom<f64> for SuggestionLimit {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::from_number(value) }
}

impl From<SuggestionLimit> for u8 {
  fn from(limit: SuggestionLimit) -> u8 { limit.0 }
}

/// The single settings record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  /// Whether suggestion requests are allowed at all.
  #[serde(default)]
  pub ai_enabled:       bool,
  #[serde(default)]
  pub suggestion_limit: SuggestionLimit,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn limit_defaults_to_two() {
    assert_eq!(SuggestionLimit::default().get(), 2);
    assert_eq!(Settings::default().suggestion_limit.get(), 2);
    assert!(!Settings::default().ai_enabled);
  }

  #[test]
  fn limit_rounds_before_range_check() {
    assert_eq!(SuggestionLimit::from_number(4.6).unwrap().get(), 5);
    assert_eq!(SuggestionLimit::from_number(0.6).unwrap().get(), 1);
    assert!(SuggestionLimit::from_number(5.6).is_err());
    assert!(SuggestionLimit::from_number(0.4).is_err());
    assert!(SuggestionLimit::from_number(f64::NAN).is_err());
  }

  #[test]
  fn limit_rejects_out_of_range_integers() {
    assert!(SuggestionLimit::new(0).is_err());
    assert!(SuggestionLimit::new(6).is_err());
    assert_eq!(SuggestionLimit::new(3).unwrap().get(), 3);
  }

  #[test]
  fn settings_deserialise_with_defaults() {
    let s: Settings = serde_json::from_str(r#"{"ai_enabled":true}"#).unwrap();
    assert!(s.ai_enabled);
    assert_eq!(s.suggestion_limit.get(), 2);

    let bad = serde_json::from_str::<Settings>(r#"{"suggestion_limit":9}"#);
    assert!(bad.is_err());
  }
}
