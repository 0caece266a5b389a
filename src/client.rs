// Typed client for the remote booking service
// Every call is a single request: no retry, no recovery, failures propagate to the caller

use crate::config::ClientConfig;
use crate::fixtures;
use crate::models::{AuthToken, BookingRecord, CreateBookingRequest, CreatedBooking, Credentials};
use crate::schema::ValidationError;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

pub const JSON: &str = "application/json";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Unexpected status: {status_code} - {body}")]
    UnexpectedStatus { status_code: u16, body: String },

    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Response failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication rejected: {0}")]
    BadCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub fn booking_path(id: impl Display) -> String {
    format!("/booking/{}", id)
}

pub fn token_cookie(token: &str) -> String {
    format!("token={}", token)
}

// Adds the `token` cookie; a token that cannot travel in a header is rejected here
pub fn with_token_cookie(mut headers: HeaderMap, token: &str) -> Result<HeaderMap, ApiError> {
    let cookie = HeaderValue::from_str(&token_cookie(token))
        .map_err(|e| ApiError::InvalidHeader(format!("cookie: {}", e)))?;
    headers.insert(COOKIE, cookie);
    Ok(headers)
}

pub fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

pub struct BookerClient<T: Transport = HttpTransport> {
    transport: T,
}

impl BookerClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    pub fn from_env() -> Result<Self, ApiError> {
        let config = ClientConfig::from_env().map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Self::new(config)
    }
}

impl<T: Transport> BookerClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // Sends the request as-is, except that a JSON body without Content-Type gets one
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if request.body.is_some() && !request.headers.contains_key(CONTENT_TYPE) {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.send(&request).await?;
        debug!(path = %request.path, status = response.status, "request completed");
        Ok(response)
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        let request = ApiRequest::new(Method::POST, "/auth")
            .headers(fixtures::json_content())
            .json(to_json(credentials)?);
        let response = expect_status(self.execute(request).await?, 200)?;

        if let Some(reason) = response
            .json()
            .as_ref()
            .and_then(|v| v.get("reason"))
            .and_then(|r| r.as_str())
        {
            return Err(ApiError::BadCredentials(reason.to_string()));
        }
        Ok(response.parse::<AuthToken>()?)
    }

    pub async fn create_booking(
        &self,
        booking: &CreateBookingRequest,
    ) -> Result<CreatedBooking, ApiError> {
        let request = ApiRequest::new(Method::POST, "/booking")
            .headers(fixtures::json_exchange())
            .json(to_json(booking)?);
        let response = expect_status(self.execute(request).await?, 200)?;
        Ok(response.parse::<CreatedBooking>()?)
    }

    // Creates the default fixture booking and returns its id
    pub async fn create_booking_id(&self, token: &AuthToken) -> Result<i64, ApiError> {
        let request = ApiRequest::new(Method::POST, "/booking")
            .headers(with_token_cookie(fixtures::json_exchange(), &token.token)?)
            .json(to_json(&fixtures::booking_payload())?);
        let response = expect_status(self.execute(request).await?, 200)?;
        Ok(response.parse::<CreatedBooking>()?.bookingid)
    }

    pub async fn get_booking(&self, id: i64) -> Result<BookingRecord, ApiError> {
        let request =
            ApiRequest::new(Method::GET, booking_path(id)).headers(fixtures::json_accept());
        let response = expect_status(self.execute(request).await?, 200)?;
        Ok(response.parse::<BookingRecord>()?)
    }

    pub async fn delete_booking(&self, id: i64, token: &AuthToken) -> Result<(), ApiError> {
        let request = ApiRequest::new(Method::DELETE, booking_path(id))
            .headers(with_token_cookie(fixtures::json_content(), &token.token)?);
        expect_status(self.execute(request).await?, 201)?;
        Ok(())
    }
}

fn expect_status(response: ApiResponse, expected: u16) -> Result<ApiResponse, ApiError> {
    if response.status == expected {
        Ok(response)
    } else {
        Err(ApiError::UnexpectedStatus {
            status_code: response.status,
            body: response.body,
        })
    }
}
