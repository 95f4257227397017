/// Input validation for form submissions
use thiserror::Error;

/// Largest trade accepted in one submission.
pub const MAX_TRADE_UNITS: i64 = 1_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Units cannot be empty")]
    UnitsEmpty,

    #[error("Units must be a whole number, got {0:?}")]
    UnitsNotANumber(String),

    #[error("Units cannot be zero")]
    UnitsZero,

    #[error("Trade too large (max {max} units, got {actual})")]
    UnitsTooLarge { max: i64, actual: i64 },
}

/// Validates the units field of a trade
///
/// Rules:
/// - Cannot be empty
/// - Must be a whole number, optionally signed (negative sells)
/// - Cannot be zero
/// - Magnitude at most MAX_TRADE_UNITS
pub fn validate_units(raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::UnitsEmpty);
    }

    let units: i64 = raw
        .parse()
        .map_err(|_| ValidationError::UnitsNotANumber(raw.to_string()))?;

    if units == 0 {
        return Err(ValidationError::UnitsZero);
    }

    if units.unsigned_abs() > MAX_TRADE_UNITS as u64 {
        return Err(ValidationError::UnitsTooLarge {
            max: MAX_TRADE_UNITS,
            actual: units,
        });
    }

    Ok(units)
}
