//! Error types for the unit model

/// Errors raised by unit registration and conversion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    /// Malformed, missing or duplicate unit input
    #[error("{0}")]
    Validation(String),

    /// Unit symbol is not registered
    #[error("unknown unit: {0}")]
    NotFound(String),

    /// The two units share no conversion path
    #[error("cannot convert {from} to {to}: units are not related")]
    Incompatible {
        /// Source unit symbol
        from: String,
        /// Target unit symbol
        to: String,
    },
}

impl UnitError {
    /// Create validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create incompatibility error
    #[inline]
    pub fn incompatible(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Incompatible {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_display_names_both_units() {
        let err = UnitError::incompatible("KG", "M");
        assert_eq!(err.to_string(), "cannot convert KG to M: units are not related");
    }

    #[test]
    fn not_found_display() {
        assert_eq!(UnitError::NotFound("XYZ".into()).to_string(), "unknown unit: XYZ");
    }
}
