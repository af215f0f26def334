use super::error::*;
use crate::application_port::*;
use crate::domain_model::{SessionId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub auth_tokens: AuthTokens,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.username.is_empty() || body.password.is_empty() {
        return Err(reject::custom(ApiErrorCode::MalformedRequest));
    }

    let login_input = LoginInput {
        username: body.username,
        password: body.password,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let login_response = LoginResponse {
        user_id: login_result.user_id,
        session_id: login_result.session_id,
        auth_tokens: login_result.tokens,
    };
    Ok(warp::reply::json(&ApiResponse::ok(login_response)))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.refresh_token.is_empty() {
        return Err(reject::custom(ApiErrorCode::MalformedRequest));
    }

    let tokens = auth_service
        .refresh_token(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub session_id: Option<SessionId>,
    pub refresh_token: Option<String>,
}

pub async fn logout(
    body: LogoutRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match (body.session_id, body.refresh_token) {
        (Some(session_id), _) => auth_service
            .logout(session_id)
            .await
            .map_err(ApiErrorCode::from)
            .map_err(reject::custom)?,
        (None, Some(token)) => auth_service
            .logout_by_token(&token)
            .await
            .map_err(ApiErrorCode::from)
            .map_err(reject::custom)?,
        (None, None) => return Err(reject::custom(ApiErrorCode::MalformedRequest)),
    }

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn trades(
    query: TradeQuery,
    _user_id: UserId,
    trade_service: Arc<dyn TradeLookupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let records = trade_service
        .query(query)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(records)))
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub address: String,
}

pub async fn geocode(
    query: GeocodeQuery,
    _user_id: UserId,
    geocode_service: Arc<dyn GeocodeService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = geocode_service
        .query(&query.address)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(result)))
}
