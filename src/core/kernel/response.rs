use crate::core::errors::{ExchangeError, HttpError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A fully read HTTP response
///
/// The body is kept as raw bytes so callers can decode into whatever shape
/// they need; a non-2xx status is classified up front and stored alongside.
#[derive(Debug, Clone)]
pub struct RestResponse {
    status: StatusCode,
    body: Arc<[u8]>,
    error: Option<HttpError>,
}

impl RestResponse {
    pub fn from_parts(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        let body: Vec<u8> = body.into();
        let body: Arc<[u8]> = body.into();
        let error = HttpError::new(status.as_u16(), String::from_utf8_lossy(&body));
        Self {
            status,
            body,
            error,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The classified HTTP error, if the status was not 2xx
    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_ref()
    }

    pub fn error_for_status(self) -> Result<Self, ExchangeError> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }

    /// Decode the body. A stored HTTP error is returned before any decoding is
    /// attempted.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ExchangeError> {
        if let Some(err) = &self.error {
            return Err(err.clone().into());
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}
