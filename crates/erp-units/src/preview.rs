//! Conversion preview
//!
//! Shows what an as-yet-unsaved factor would do to a few sample values so
//! the operator can confirm it before submitting the unit.

use crate::error::UnitError;
use crate::unit::UnitSymbol;
use serde::{Deserialize, Serialize};

/// One previewed sample: `output = input * factor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    /// Amount in the base unit
    pub input: f64,
    /// Amount in the target unit
    pub output: f64,
}

/// Preview `factor` between `base` and `target` over `samples`
///
/// Pure function: the registry is never consulted or modified.
///
/// # Errors
/// `UnitError::Validation` for blank or identical symbols and for factors
/// that are not finite and positive
pub fn preview_conversion(
    base: &str,
    target: &str,
    factor: f64,
    samples: &[f64],
) -> Result<Vec<PreviewRow>, UnitError> {
    let base = UnitSymbol::new(base)?;
    let target = UnitSymbol::new(target)?;
    if base == target {
        return Err(UnitError::validation(format!(
            "unit {base} cannot declare a conversion to itself"
        )));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(UnitError::validation(format!(
            "conversion factor {base} -> {target} must be greater than zero"
        )));
    }

    Ok(samples
        .iter()
        .map(|&input| PreviewRow {
            input,
            output: input * factor,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_multiplies_each_sample() {
        let rows = preview_conversion("kg", "g", 1000.0, &[1.0, 2.5, 0.0]).unwrap();
        assert_eq!(
            rows,
            vec![
                PreviewRow { input: 1.0, output: 1000.0 },
                PreviewRow { input: 2.5, output: 2500.0 },
                PreviewRow { input: 0.0, output: 0.0 },
            ]
        );
    }

    #[test]
    fn preview_rejects_bad_factor() {
        assert!(preview_conversion("KG", "G", 0.0, &[1.0]).is_err());
        assert!(preview_conversion("KG", "G", -1.0, &[1.0]).is_err());
        assert!(preview_conversion("KG", "kg", 2.0, &[1.0]).is_err());
    }

    #[test]
    fn preview_of_no_samples_is_empty() {
        assert!(preview_conversion("KG", "G", 1000.0, &[]).unwrap().is_empty());
    }
}
