//! Mapping of collection errors onto HTTP responses

use axum::{http::StatusCode, response::Json};
use sentinel_errors::Error;
use sentinel_types::api::ErrorResponse;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Result type returned by REST handlers
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::UnauthorizedSigner(_) => StatusCode::FORBIDDEN,
        Error::DuplicateSigner(_) | Error::AlreadyExecuted(_) | Error::QuorumNotMet { .. } => {
            StatusCode::CONFLICT
        }
        Error::SigningError(_) | Error::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::InvalidDigestLength { .. }
        | Error::InvalidHex(_)
        | Error::InvalidSignature(_)
        | Error::InvalidThreshold { .. }
        | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    }
}

pub fn error_response(err: Error) -> ApiError {
    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code(),
        }),
    )
}

/// Metric label for a rejected signature
pub fn rejection_reason(err: &Error) -> &'static str {
    match err {
        Error::InvalidSignature(_) | Error::InvalidHex(_) => "invalid_signature",
        Error::DuplicateSigner(_) => "duplicate_signer",
        Error::UnauthorizedSigner(_) => "unauthorized_signer",
        Error::NotFound(_) => "not_found",
        _ => "invalid_request",
    }
}
