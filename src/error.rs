//! Error types.
//!
//! Two layers:
//!
//! - [`IprError`]: what the core (regression, model inversion, curve building) can fail with.
//! - [`AppError`]: what the `ipr` binary reports, carrying a process exit code.
//!
//! Every `IprError` converts into an `AppError` so pipeline code can use `?` freely.

use crate::domain::Method;

/// Failures raised by the fitting and curve-construction core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IprError {
    /// User-supplied inputs violate a physical ordering or presence constraint.
    #[error("validation error: {0}")]
    Validation(String),

    /// Regression cannot be performed (degenerate or fully masked data).
    #[error("numerical error ({method}): {message}")]
    Numerical { method: String, message: String },

    /// An inversion step has no real or physical solution.
    #[error("invalid model ({method}): {message}")]
    InvalidModel { method: String, message: String },
}

impl IprError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn numerical(method: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Numerical {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_model(method: Method, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            method: method.display_name().to_string(),
            message: message.into(),
        }
    }

    /// Re-attribute a numerical or model error to `method`.
    ///
    /// Shared primitives (the regression engine) raise errors under a generic label.
    pub fn for_method(self, method: Method) -> Self {
        match self {
            IprError::Numerical { message, .. } => IprError::numerical(method, message),
            IprError::InvalidModel { message, .. } => IprError::invalid_model(method, message),
            other => other,
        }
    }

    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            IprError::Validation(_) => 2,
            IprError::Numerical { .. } => 3,
            IprError::InvalidModel { .. } => 4,
        }
    }
}

pub type IprResult<T> = Result<T, IprError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<IprError> for AppError {
    fn from(err: IprError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        let v = IprError::validation("Pwf > Pws");
        let n = IprError::numerical(Method::Backpressure, "zero variance");
        let m = IprError::invalid_model(Method::LitPressureSquared, "negative discriminant");

        assert_eq!(AppError::from(v).exit_code(), 2);
        assert_eq!(AppError::from(n.clone()).exit_code(), 3);
        assert_eq!(AppError::from(m.clone()).exit_code(), 4);
        assert!(n.to_string().contains("Simplified Backpressure"));
        assert!(m.to_string().contains("negative discriminant"));
    }
}
