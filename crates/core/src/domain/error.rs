// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid scheme code: {0}")]
    InvalidSchemeCode(String),

    #[error("Invalid NAV value: {0}")]
    InvalidNav(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Duplicate fund in catalog: {0}")]
    DuplicateFund(String),

    #[error("Fund not found: {0}")]
    FundNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
