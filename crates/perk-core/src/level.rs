//! Loyalty levels and the multiplier lookup used by the earn path.
//!
//! Levels are read-only reference data here. Nothing in the core promotes or
//! demotes a user; `min_points` is informational.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The level assigned to every newly registered user.
pub const DEFAULT_LEVEL_NAME: &str = "Bronze";

/// A named tier that scales how many points a purchase earns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyLevel {
  pub id:               Uuid,
  pub name:             String,
  pub min_points:       i64,
  /// Exact decimal so that `floor(amount * multiplier)` never lands one
  /// point short through binary rounding.
  pub bonus_multiplier: Decimal,
  pub description:      Option<String>,
}

/// Input to the catalog writer for levels.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLevel {
  pub name:             String,
  pub min_points:       i64,
  pub bonus_multiplier: Decimal,
  #[serde(default)]
  pub description:      Option<String>,
}

impl NewLevel {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidInput("level name is required".into()));
    }
    if self.min_points < 0 {
      return Err(Error::InvalidInput("min_points must not be negative".into()));
    }
    if self.bonus_multiplier <= Decimal::ZERO {
      return Err(Error::InvalidInput("bonus_multiplier must be positive".into()));
    }
    Ok(())
  }
}

/// The multiplier applied to earned purchase amounts; `1` when the user has no
/// level.
pub fn bonus_multiplier(level: Option<&LoyaltyLevel>) -> Decimal {
  level.map_or(Decimal::ONE, |l| l.bonus_multiplier)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn level(multiplier: Decimal) -> LoyaltyLevel {
    LoyaltyLevel {
      id:               Uuid::new_v4(),
      name:             "Gold".into(),
      min_points:       5000,
      bonus_multiplier: multiplier,
      description:      None,
    }
  }

  #[test]
  fn missing_level_defaults_to_one() {
    assert_eq!(bonus_multiplier(None), Decimal::ONE);
  }

  #[test]
  fn level_multiplier_is_returned() {
    let gold = level(Decimal::new(15, 1));
    assert_eq!(bonus_multiplier(Some(&gold)), Decimal::new(15, 1));
  }

  #[test]
  fn non_positive_multiplier_is_invalid() {
    let input = NewLevel {
      name:             "Broken".into(),
      min_points:       0,
      bonus_multiplier: Decimal::ZERO,
      description:      None,
    };
    assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));
  }
}
