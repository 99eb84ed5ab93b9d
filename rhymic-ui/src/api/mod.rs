//! Authentication service interface
//!
//! The network client sits behind the [`AuthApi`] trait so the session store
//! can be driven by a mock service in tests, and so the HTTP transport can
//! be swapped without touching session logic.

mod client;

pub use client::HttpAuthClient;

use async_trait::async_trait;
use rhymic_common::api::LoginResponse;
use thiserror::Error;

/// Errors returned by the authentication service interface
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Service was reachable and rejected the request (non-2xx status)
    #[error("service rejected request (status {status})")]
    Rejected {
        /// HTTP status code of the response
        status: u16,
        /// Service-reported reason, when the body carried one
        message: Option<String>,
    },

    /// Service unreachable or the request failed in transit
    #[error("network error: {0}")]
    Network(String),

    /// Response arrived but could not be parsed
    #[error("failed to parse service response: {0}")]
    Parse(String),
}

impl ApiError {
    /// User-facing message for this error
    ///
    /// A service-reported reason wins; otherwise network and parse failures
    /// surface their own description, and a bare rejection falls back to the
    /// caller-provided generic text. The UI makes no distinction between the
    /// error kinds beyond this message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Rejected { message: None, .. } => fallback.to_string(),
            ApiError::Network(description) => description.clone(),
            ApiError::Parse(description) => description.clone(),
        }
    }
}

/// Avatar image payload selected for upload
#[derive(Debug, Clone)]
pub struct AvatarImage {
    /// Original file name, forwarded as the multipart part file name
    pub file_name: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

/// Client interface to the Rhymic authentication service
///
/// One method per service operation; see the wire contract documented in
/// `rhymic_common::api`. Implementations must not retry internally.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a bearer token and user profile
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Create an account; success carries no session data
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError>;

    /// Upload an avatar image under the given bearer token
    ///
    /// Returns the server-relative path of the stored image.
    async fn upload_avatar(&self, token: &str, image: AvatarImage) -> Result<String, ApiError>;
}

#[async_trait]
impl<T: AuthApi + ?Sized> AuthApi for std::sync::Arc<T> {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        (**self).login(email, password).await
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        (**self).signup(name, email, password).await
    }

    async fn upload_avatar(&self, token: &str, image: AvatarImage) -> Result<String, ApiError> {
        (**self).upload_avatar(token, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_message_wins_over_fallback() {
        let err = ApiError::Rejected {
            status: 401,
            message: Some("Invalid".to_string()),
        };
        assert_eq!(err.user_message("Login failed."), "Invalid");
    }

    #[test]
    fn test_bare_rejection_uses_fallback() {
        let err = ApiError::Rejected {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message("Login failed."), "Login failed.");
    }

    #[test]
    fn test_network_error_surfaces_description() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.user_message("Login failed."), "connection refused");
    }
}
