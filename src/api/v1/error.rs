use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.clone(), code.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (ApiErrorCode::MalformedRequest, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (ApiErrorCode::MalformedRequest, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        if e.name().eq_ignore_ascii_case("authorization") {
            (ApiErrorCode::InvalidToken, ApiErrorCode::InvalidToken.to_string())
        } else {
            (ApiErrorCode::MalformedRequest, e.to_string())
        }
    } else if err.is_not_found() {
        (ApiErrorCode::NotFound, ApiErrorCode::NotFound.to_string())
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (
            ApiErrorCode::InternalError,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Account is disabled")]
    AccountDisabled,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Session is no longer valid, please log in again")]
    SessionInvalid,
    #[error("Malformed request")]
    MalformedRequest,
    #[error("Not found")]
    NotFound,
    #[error("Lookup provider failed")]
    LookupFailed,
    #[error("Storage temporarily unavailable")]
    StorageUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::AccountDisabled
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::SessionInvalid => StatusCode::UNAUTHORIZED,
            ApiErrorCode::MalformedRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::LookupFailed => StatusCode::BAD_GATEWAY,
            ApiErrorCode::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::AccountDisabled => ApiErrorCode::AccountDisabled,
            AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::TokenTypeMismatch => {
                ApiErrorCode::InvalidToken
            }
            AuthError::SessionNotFound
            | AuthError::SessionRevoked
            | AuthError::ReplayDetected => ApiErrorCode::SessionInvalid,
            AuthError::Store(e) => {
                warn!("Storage failure: {}", e);
                ApiErrorCode::StorageUnavailable
            }
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<LookupError> for ApiErrorCode {
    fn from(error: LookupError) -> Self {
        warn!("Lookup failure: {}", error);
        ApiErrorCode::LookupFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_unauthorized() {
        for error in [
            AuthError::InvalidCredentials,
            AuthError::AccountDisabled,
            AuthError::TokenInvalid,
            AuthError::TokenExpired,
            AuthError::TokenTypeMismatch,
            AuthError::SessionNotFound,
            AuthError::SessionRevoked,
            AuthError::ReplayDetected,
        ] {
            let code = ApiErrorCode::from(error);
            assert_eq!(code.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn transient_storage_failure_is_not_an_auth_failure() {
        let code = ApiErrorCode::from(AuthError::Store("pool timed out".to_string()));
        assert_eq!(code.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_user_and_wrong_password_share_a_response_shape() {
        let a = ApiErrorCode::from(AuthError::InvalidCredentials);
        let b = ApiErrorCode::from(AuthError::InvalidCredentials);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.status(), b.status());
    }
}
