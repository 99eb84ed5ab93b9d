//! Session store
//!
//! Owns the client's authentication state: user identity, bearer token and
//! the last visible error. State is hydrated from durable storage at
//! startup, mutated only by the operations below, and every successful
//! mutation is written to storage *before* the in-memory state changes, so
//! storage and memory never diverge within one operation.
//!
//! State machine: Anonymous -> Authenticating -> Authenticated, where an
//! error leaves the store Anonymous with `error` set (recoverable, cleared
//! by the next attempt). Signup never transitions the machine; it only
//! surfaces errors.

pub mod storage;

pub use storage::{MemoryStorage, SessionStorage, SqliteStorage, KEY_TOKEN, KEY_USER};

use crate::api::{AuthApi, AvatarImage};
use rhymic_common::events::{EventBus, RhymicEvent};
use rhymic_common::{Result, UserProfile};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Fallback message when a rejected login carries no reason
const LOGIN_FALLBACK_MESSAGE: &str = "Login failed due to an unknown error.";

/// Fallback message when a rejected signup carries no reason
const SIGNUP_FALLBACK_MESSAGE: &str = "Signup failed due to an unknown error.";

/// Fallback message when a rejected avatar upload carries no reason
const AVATAR_FALLBACK_MESSAGE: &str = "Avatar upload failed.";

/// Coarse authentication phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// No session; `error` may carry the reason the last attempt failed
    #[default]
    Anonymous,
    /// A credential exchange is in flight
    Authenticating,
    /// A token and profile are held
    Authenticated,
}

/// Point-in-time copy of the session state, the UI-facing read surface
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Authenticated user profile, absent when Anonymous
    pub user: Option<UserProfile>,
    /// Opaque bearer token, set and cleared together with `user`
    pub token: Option<String>,
    /// Last login/signup error; at most one is visible at a time
    pub error: Option<String>,
    /// Last avatar upload error, kept separate from `error` so a failed
    /// upload never masquerades as an authentication problem
    pub avatar_error: Option<String>,
    /// Current phase of the authentication state machine
    pub phase: AuthPhase,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<UserProfile>,
    token: Option<String>,
    error: Option<String>,
    avatar_error: Option<String>,
    phase: AuthPhase,
    /// Monotonically increasing login attempt counter. Guarded by the state
    /// lock: it is bumped when an attempt starts and compared at apply time,
    /// inside the same critical section that persists and applies the
    /// response, so a superseded response can never slip in between.
    login_generation: u64,
}

/// Client-side session store
///
/// Generic over the service client and the persistence adapter so tests can
/// inject a mock service and in-memory storage. All operations run on the
/// single client event thread; network calls are awaited without blocking
/// other work.
pub struct SessionStore<A: AuthApi, S: SessionStorage> {
    api: A,
    storage: S,
    state: RwLock<SessionState>,
    event_bus: EventBus,
}

impl<A: AuthApi, S: SessionStorage> SessionStore<A, S> {
    /// Open the store, hydrating session state from durable storage
    ///
    /// Absent keys yield an Anonymous store. A profile that fails to decode
    /// is treated as absent (with a warning) rather than failing startup.
    pub async fn open(api: A, storage: S, event_bus: EventBus) -> Result<Self> {
        let token = storage.get(KEY_TOKEN).await?;
        let user = match storage.get(KEY_USER).await? {
            Some(json) => match serde_json::from_str::<UserProfile>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "stored user profile is undecodable, starting anonymous");
                    None
                }
            },
            None => None,
        };

        let phase = if token.is_some() && user.is_some() {
            info!("restored persisted session");
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        };

        Ok(Self {
            api,
            storage,
            state: RwLock::new(SessionState {
                user,
                token,
                error: None,
                avatar_error: None,
                phase,
                login_generation: 0,
            }),
            event_bus,
        })
    }

    // ========================================
    // Operations
    // ========================================

    /// Exchange credentials for a session
    ///
    /// Clears any prior error before the request starts, so at most one
    /// error is ever visible. On success the token and profile are persisted
    /// and the store transitions to Authenticated; on failure `error` is set
    /// and any previously held session is left untouched. Returns whether a
    /// new session was established.
    ///
    /// A response superseded by a newer login attempt is discarded without
    /// touching state or storage and reported as `false`. The staleness
    /// check, the storage writes and the in-memory update form one critical
    /// section under the state lock, so no newer attempt can start between
    /// the check and the apply.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let generation = {
            let mut state = self.state.write().await;
            state.error = None;
            state.phase = AuthPhase::Authenticating;
            state.login_generation += 1;
            state.login_generation
        };

        match self.api.login(email, password).await {
            Ok(response) => {
                let mut state = self.state.write().await;
                if state.login_generation != generation {
                    debug!(generation, "discarding superseded login response");
                    return false;
                }

                // Persist before the in-memory update; a persistence failure
                // is surfaced like any other failed attempt
                if let Err(e) = self.persist_session(&response.token, &response.user).await {
                    warn!(error = %e, "failed to persist session");
                    let message = e.to_string();
                    Self::mark_login_failed(&mut state, message.clone());
                    drop(state);
                    self.event_bus.emit(RhymicEvent::LoginFailed {
                        message,
                        timestamp: chrono::Utc::now(),
                    });
                    return false;
                }

                state.user = Some(response.user.clone());
                state.token = Some(response.token);
                state.error = None;
                state.phase = AuthPhase::Authenticated;
                drop(state);

                info!(user_id = response.user.id, "login succeeded");
                self.event_bus.emit(RhymicEvent::LoggedIn {
                    user: response.user,
                    timestamp: chrono::Utc::now(),
                });
                true
            }
            Err(err) => {
                let message = err.user_message(LOGIN_FALLBACK_MESSAGE);
                debug!(message = %message, "login failed");

                let mut state = self.state.write().await;
                if state.login_generation != generation {
                    debug!(generation, "discarding superseded login failure");
                    return false;
                }
                Self::mark_login_failed(&mut state, message.clone());
                drop(state);

                self.event_bus.emit(RhymicEvent::LoginFailed {
                    message,
                    timestamp: chrono::Utc::now(),
                });
                false
            }
        }
    }

    /// Create an account
    ///
    /// Same request/error pattern as [`login`](Self::login), but success
    /// establishes no session: the caller is responsible for routing the
    /// user to the login form. Never mutates `user` or `token`.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> bool {
        {
            let mut state = self.state.write().await;
            state.error = None;
        }

        match self.api.signup(name, email, password).await {
            Ok(()) => {
                info!(email = %email, "signup succeeded");
                self.event_bus.emit(RhymicEvent::SignupCompleted {
                    email: email.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                true
            }
            Err(err) => {
                let message = err.user_message(SIGNUP_FALLBACK_MESSAGE);
                debug!(message = %message, "signup failed");
                let mut state = self.state.write().await;
                state.error = Some(message);
                false
            }
        }
    }

    /// Clear the session
    ///
    /// Local-only: removes both persisted keys and resets the in-memory
    /// state to Anonymous with no error. No server-side invalidation is
    /// performed. Idempotent.
    pub async fn logout(&self) {
        if let Err(e) = self.storage.remove(KEY_TOKEN).await {
            warn!(error = %e, "failed to remove persisted token");
        }
        if let Err(e) = self.storage.remove(KEY_USER).await {
            warn!(error = %e, "failed to remove persisted user profile");
        }

        let mut state = self.state.write().await;
        // The attempt counter survives the reset so an in-flight login from
        // before the logout can never match a post-logout attempt
        *state = SessionState {
            login_generation: state.login_generation,
            ..SessionState::default()
        };
        drop(state);

        info!("session cleared");
        self.event_bus.emit(RhymicEvent::LoggedOut {
            timestamp: chrono::Utc::now(),
        });
    }

    /// Upload a new avatar image and merge the result into the profile
    ///
    /// Requires an existing token; without one the service call would be
    /// unauthorized, so the operation returns `false` without any network
    /// traffic. On success only `profile_pic` changes and the full profile
    /// is re-persisted. Failures set `avatar_error` (never the shared
    /// `error` field) and leave the session unchanged.
    pub async fn update_avatar(&self, image: AvatarImage) -> bool {
        let token = { self.state.read().await.token.clone() };
        let Some(token) = token else {
            debug!("avatar upload skipped: no session token");
            return false;
        };

        match self.api.upload_avatar(&token, image).await {
            Ok(url) => self.apply_avatar(url).await,
            Err(err) => {
                let message = err.user_message(AVATAR_FALLBACK_MESSAGE);
                warn!(message = %message, "avatar upload failed");
                let mut state = self.state.write().await;
                state.avatar_error = Some(message.clone());
                drop(state);
                self.event_bus.emit(RhymicEvent::AvatarUploadFailed {
                    message,
                    timestamp: chrono::Utc::now(),
                });
                false
            }
        }
    }

    // ========================================
    // Read surface (UI binding interface)
    // ========================================

    /// Current session state as a point-in-time copy
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            user: state.user.clone(),
            token: state.token.clone(),
            error: state.error.clone(),
            avatar_error: state.avatar_error.clone(),
            phase: state.phase,
        }
    }

    /// Subscribe to state-change notifications
    ///
    /// Dropping the receiver detaches the subscription, so a view holds it
    /// only while mounted and nothing leaks across remounts.
    pub fn subscribe(&self) -> broadcast::Receiver<RhymicEvent> {
        self.event_bus.subscribe()
    }

    // ========================================
    // Internals
    // ========================================

    async fn persist_session(&self, token: &str, user: &UserProfile) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.put(KEY_TOKEN, token).await?;
        self.storage.put(KEY_USER, &user_json).await?;
        Ok(())
    }

    fn mark_login_failed(state: &mut SessionState, message: String) {
        state.error = Some(message);
        // A failed attempt never clears an existing session; the phase
        // reverts to whatever the held token implies
        state.phase = if state.token.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        };
    }

    /// Merge a freshly uploaded avatar path into the profile (shallow: only
    /// `profile_pic` changes), re-persisting the full profile first
    async fn apply_avatar(&self, url: String) -> bool {
        let updated = {
            let state = self.state.read().await;
            match &state.user {
                Some(user) => {
                    let mut user = user.clone();
                    user.profile_pic = Some(url.clone());
                    user
                }
                // Token without a profile cannot occur through this store's
                // operations; treat it like a failed upload
                None => {
                    warn!("avatar upload resolved with no profile to update");
                    return false;
                }
            }
        };

        let user_json = match serde_json::to_string(&updated) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize updated profile");
                return false;
            }
        };
        if let Err(e) = self.storage.put(KEY_USER, &user_json).await {
            warn!(error = %e, "failed to persist updated profile");
            return false;
        }

        let mut state = self.state.write().await;
        state.user = Some(updated);
        state.avatar_error = None;
        drop(state);

        info!(profile_pic = %url, "avatar updated");
        self.event_bus.emit(RhymicEvent::AvatarUpdated {
            profile_pic: url,
            timestamp: chrono::Utc::now(),
        });
        true
    }
}
