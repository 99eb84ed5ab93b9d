//! Shared API request/response types
//!
//! Wire types for the Rhymic authentication service. The contract is JSON
//! over HTTP:
//!
//! | Operation | Method & path | Success body |
//! |---|---|---|
//! | Login | POST /api/login | `{token, user}` |
//! | Signup | POST /api/signup | `{message}` (unused by clients) |
//! | Avatar upload | POST /api/upload_avatar | `{url}` |
//!
//! Failure responses carry a non-2xx status and a `{message}` body; the
//! message field may be absent, in which case clients fall back to a generic
//! error string.

use crate::types::UserProfile;
use serde::{Deserialize, Serialize};

// ========================================
// Request Types
// ========================================

/// Credential exchange request body for POST /api/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account creation request body for POST /api/signup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

// ========================================
// Response Types
// ========================================

/// Successful login response: opaque bearer token plus the user profile
///
/// The token is never decoded client-side; expiry is a server concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Successful avatar upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarUploadResponse {
    /// Server-relative path to the stored avatar image
    pub url: String,
}

/// Error (and signup success) response body
///
/// The service reports failures as `{"message": "..."}`; the field is
/// optional because some failure modes return an empty body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceMessage {
    #[serde(default)]
    pub message: Option<String>,
}
