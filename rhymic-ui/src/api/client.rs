//! HTTP implementation of the authentication service interface
//!
//! Thin reqwest wrapper over the Rhymic service contract. Each method maps
//! transport failures to [`ApiError::Network`], non-2xx responses to
//! [`ApiError::Rejected`] (extracting the `{message}` body when present),
//! and undecodable success bodies to [`ApiError::Parse`].

use super::{ApiError, AuthApi, AvatarImage};
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::{Client, Response, StatusCode};
use rhymic_common::api::{
    AvatarUploadResponse, LoginRequest, LoginResponse, ServiceMessage, SignupRequest,
};
use std::time::Duration;
use tracing::debug;

/// Default timeout for authentication service requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the Rhymic authentication service
pub struct HttpAuthClient {
    /// HTTP client for API requests
    http_client: Client,
    /// Service base URL, e.g. "http://127.0.0.1:5000"
    base_url: String,
}

impl HttpAuthClient {
    /// Create a new client against the given service base URL
    ///
    /// A trailing slash on the base URL is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a non-2xx response into `ApiError::Rejected`
    ///
    /// The failure body is `{message}` when the service had a reason to
    /// report; an empty or undecodable body yields a bare rejection.
    async fn rejection(response: Response) -> ApiError {
        let status = response.status();
        let message = response
            .json::<ServiceMessage>()
            .await
            .ok()
            .and_then(|body| body.message);
        ApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        debug!(email = %email, "sending login request");

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http_client
            .post(self.endpoint("/api/login"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        debug!(email = %email, "sending signup request");

        let request = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http_client
            .post(self.endpoint("/api/signup"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // Success body carries no session data and is deliberately unused
        Ok(())
    }

    async fn upload_avatar(&self, token: &str, image: AvatarImage) -> Result<String, ApiError> {
        debug!(file_name = %image.file_name, size = image.bytes.len(), "uploading avatar");

        let form = multipart::Form::new().part(
            "image",
            multipart::Part::bytes(image.bytes).file_name(image.file_name),
        );
        let response = self
            .http_client
            .post(self.endpoint("/api/upload_avatar"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        // Failure body is ignored per the service contract
        if !response.status().is_success() {
            let status: StatusCode = response.status();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: None,
            });
        }

        let body = response
            .json::<AvatarUploadResponse>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(body.url)
    }
}
