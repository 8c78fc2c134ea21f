use thiserror::Error;

pub type Result<T> = std::result::Result<T, SurvivalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurvivalError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// newton-raphson gave up - carries the last iterate so callers can
    /// look for separation or collinearity
    #[error("cox fit did not converge after {iterations} iterations: {reason} (loglik = {loglikelihood})")]
    ConvergenceFailure {
        reason: String,
        iterations: usize,
        loglikelihood: f64,
        coefficients: Vec<f64>,
    },
}

impl SurvivalError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn convergence_failure(
        reason: impl Into<String>,
        iterations: usize,
        loglikelihood: f64,
        coefficients: Vec<f64>,
    ) -> Self {
        Self::ConvergenceFailure {
            reason: reason.into(),
            iterations,
            loglikelihood,
            coefficients,
        }
    }

    /// true for bad input, false for numerical failures
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::ConvergenceFailure { .. })
    }
}
