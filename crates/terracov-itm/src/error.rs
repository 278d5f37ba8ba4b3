//! Error types for ITM operations

use thiserror::Error;

/// Result type for ITM operations
pub type ItmResult<T> = Result<T, ItmError>;

/// Errors that can occur when evaluating the ITM
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItmError {
    /// TX terminal height is negative or not finite
    #[error("TX terminal height out of range (must be a finite value >= 0 meters, got {0})")]
    TxHeightOutOfRange(f64),

    /// RX terminal height is negative or not finite
    #[error("RX terminal height out of range (must be a finite value >= 0 meters, got {0})")]
    RxHeightOutOfRange(f64),

    /// Confidence percentage out of range
    #[error("Confidence percentage out of range (must be 0 < confidence < 100, got {0})")]
    ConfidenceOutOfRange(f64),

    /// Reliability percentage out of range
    #[error("Reliability percentage out of range (must be 0 < reliability < 100, got {0})")]
    ReliabilityOutOfRange(f64),

    /// Surface refractivity is not a positive finite value
    #[error("Surface refractivity out of range (must be > 0 N-Units, got {0})")]
    RefractivityOutOfRange(f64),

    /// Frequency is not a positive finite value
    #[error("Frequency out of range (must be > 0 MHz, got {0})")]
    FrequencyOutOfRange(f64),

    /// Invalid sigma (conductivity)
    #[error("Invalid sigma value (must be > 0 S/m, got {0})")]
    InvalidSigma(f64),

    /// Invalid mode of variability
    #[error("Invalid mode of variability {0}")]
    InvalidMdvar(i32),

    /// A numeric precondition of the algorithm does not hold
    #[error("Outside the model domain: {0}")]
    InvalidDomain(String),
}

impl ItmError {
    /// Returns true for errors caused by parameters outside their documented
    /// ranges, as opposed to numeric failures of a single evaluation.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, ItmError::InvalidDomain(_))
    }

    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        ItmError::InvalidDomain(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ItmError::InvalidMdvar(9).is_configuration());
        assert!(ItmError::TxHeightOutOfRange(-1.0).is_configuration());
        assert!(!ItmError::domain("distance must be positive").is_configuration());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ItmError::InvalidMdvar(4).to_string(),
            "Invalid mode of variability 4"
        );
        assert_eq!(
            ItmError::domain("profile too short").to_string(),
            "Outside the model domain: profile too short"
        );
    }
}
