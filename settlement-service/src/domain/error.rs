use rust_decimal::Decimal;
use service_core::error::AppError;
use thiserror::Error;

/// Invalid input rejected before any computation runs. Amounts are never
/// clamped; a negative value is always an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    #[error("{field} must not be negative (got {value})")]
    NegativePrice { field: &'static str, value: Decimal },

    #[error("{field} must not be negative (got {value})")]
    NegativeQuantity { field: &'static str, value: i64 },
}

impl From<CalculationError> for AppError {
    fn from(err: CalculationError) -> Self {
        AppError::BadRequest(anyhow::anyhow!(err))
    }
}
