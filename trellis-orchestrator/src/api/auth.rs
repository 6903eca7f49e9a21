//! Caller identity extraction
//!
//! The orchestrator sits behind an authorizing gateway that has already
//! answered "may this actor operate on this pipeline". What arrives here is
//! the authenticated identity (for audit attribution) and the actor's
//! provider access token (forwarded to CI/VCS calls made on their behalf).

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::error::ApiError;

const USER_HEADER: &str = "x-forwarded-user";

/// Authenticated caller forwarded by the gateway
#[derive(Debug, Clone)]
pub struct Caller {
    pub username: String,
    pub access_token: String,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Forwarded-User header".to_string()))?;

        let access_token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer access token".to_string()))?;

        Ok(Caller {
            username,
            access_token,
        })
    }
}
