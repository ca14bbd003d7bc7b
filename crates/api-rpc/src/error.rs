//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use navtrack_core::domain::DomainError;
use navtrack_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
    pub const SOURCE_ERROR: i32 = 5002;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::NotFound(_) => code::NOT_FOUND,
        AppError::Domain(DomainError::FundNotFound(_)) => code::NOT_FOUND,
        AppError::Domain(_) => code::VALIDATION_ERROR,
        AppError::Database(_) => code::DB_ERROR,
        AppError::Source(_) => code::SOURCE_ERROR,
        AppError::Io(_)
        | AppError::Serialization(_)
        | AppError::Config(_)
        | AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}
