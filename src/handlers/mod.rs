//! Route handlers and the extractors they share.

pub mod chat;
pub mod search;
pub mod system;

use std::convert::Infallible;
use std::net::IpAddr;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::middleware::client_ip;

pub const SESSION_HEADER: &str = "x-session-id";

/// JSON body parsed regardless of `Content-Type`.
///
/// Any read or parse failure becomes a 400.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            debug!(error = %e, "Failed to read request body");
            ApiError::bad_request("Invalid request body")
        })?;
        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            debug!(error = %e, "Failed to parse request body");
            ApiError::bad_request("Invalid request body")
        })
    }
}

/// Who is calling: session header, user agent and address.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    /// `X-Session-ID` verbatim, or empty.
    pub session_id: String,
    pub user_agent: Option<String>,
    pub ip: Option<IpAddr>,
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            session_id: header_text(&parts.headers, SESSION_HEADER).unwrap_or_default(),
            user_agent: header_text(&parts.headers, header::USER_AGENT),
            ip: client_ip(&parts.headers, &parts.extensions),
        })
    }
}

fn header_text<K: header::AsHeaderName>(headers: &HeaderMap, name: K) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
