//! Profile popup and avatar upload coordination
//!
//! The profile popup is a plain visibility toggle, independent of the search
//! dropdown (both may be open at once). Picking a file uploads it
//! immediately through the session store; there is no preview or confirm
//! step.

use crate::api::{AuthApi, AvatarImage};
use crate::session::{SessionStore, SessionStorage};
use rhymic_common::UserProfile;
use std::path::Path;
use tracing::warn;

/// Profile popup visibility state
#[derive(Debug, Default)]
pub struct ProfilePanel {
    show_profile: bool,
}

impl ProfilePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the popup is currently shown
    pub fn is_open(&self) -> bool {
        self.show_profile
    }

    /// Toggle popup visibility (the avatar button)
    pub fn toggle(&mut self) {
        self.show_profile = !self.show_profile;
    }

    /// Close the popup
    pub fn close(&mut self) {
        self.show_profile = false;
    }
}

/// Build the displayable avatar URL for a user
///
/// `profile_pic` is a server-relative path; display requires prefixing the
/// API base URL. The server's "no avatar yet" default is an empty string,
/// which yields `None` just like an absent field.
pub fn avatar_url(base_url: &str, user: Option<&UserProfile>) -> Option<String> {
    let path = user?.profile_pic.as_deref().filter(|p| !p.is_empty())?;
    Some(format!("{}{}", base_url.trim_end_matches('/'), path))
}

/// Handle a picked avatar file: read it and upload immediately
///
/// Read failures are reported as `false` with a warning; upload failures
/// follow the session store's avatar error handling.
pub async fn pick_avatar_file<A: AuthApi, S: SessionStorage>(
    store: &SessionStore<A, S>,
    path: &Path,
) -> bool {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read picked avatar file");
            return false;
        }
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "avatar".to_string());

    store.update_avatar(AvatarImage { file_name, bytes }).await
}
