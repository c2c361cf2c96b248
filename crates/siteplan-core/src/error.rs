//! Unified error type for the planning engine
//!
//! Only *configuration* failures travel through [`PlanError`]. An infeasible
//! site or a breached constraint is not an error: it is reported inside the
//! returned [`crate::OptimizationResult`] with `feasible = false`.
//!
//! # Example
//!
//! ```ignore
//! use siteplan_core::{PlanError, PlanResult};
//!
//! fn pick(problem_type: u8) -> PlanResult<()> {
//!     if !(1..=5).contains(&problem_type) {
//!         return Err(PlanError::Config(format!("Unknown problem type: {problem_type}")));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Error type for all planning operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Malformed input data (empty trajectory, negative caps, bad profile length)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wiring mistakes: unknown problem type, unbuilt model, no solver
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using PlanError.
pub type PlanResult<T> = Result<T, PlanError>;

impl PlanError {
    /// True for errors caused by upstream wiring rather than by data.
    pub fn is_config(&self) -> bool {
        matches!(self, PlanError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanError::Config("Model not built".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Model not built"));
        assert!(err.is_config());
    }

    #[test]
    fn test_validation_is_not_config() {
        let err = PlanError::Validation("load trajectory is empty".into());
        assert!(!err.is_config());
        assert_eq!(err.to_string(), "Validation error: load trajectory is empty");
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> PlanResult<()> {
            Err(PlanError::Validation("load trajectory is empty".into()))
        }

        fn outer() -> PlanResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
