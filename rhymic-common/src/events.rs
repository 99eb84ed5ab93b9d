//! Event types for the Rhymic client event system
//!
//! Provides the shared event definitions and EventBus used to notify UI
//! subscribers of session and catalog state changes.

use crate::types::{SongCatalogEntry, UserProfile};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Rhymic client event types
///
/// Events are broadcast via [`EventBus`] after the originating store has
/// finished mutating its state, so a subscriber that reacts by reading a
/// snapshot always observes the post-mutation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RhymicEvent {
    /// A login attempt succeeded and the session is now authenticated
    LoggedIn {
        /// Profile returned by the authentication service
        user: UserProfile,
        /// When the session was established
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A login attempt was rejected or failed to reach the service
    LoginFailed {
        /// User-facing error message (service-reported or generic fallback)
        message: String,
        /// When the attempt resolved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An account was created; no session was established
    ///
    /// Signup and login are deliberately decoupled: the caller is expected
    /// to route the user to the login form next.
    SignupCompleted {
        /// Email the account was registered under
        email: String,
        /// When the signup resolved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session was cleared (local-only operation)
    LoggedOut {
        /// When the session was cleared
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The avatar upload succeeded and the profile was re-persisted
    AvatarUpdated {
        /// New server-relative avatar path
        profile_pic: String,
        /// When the upload resolved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The avatar upload failed; session state is unchanged
    AvatarUploadFailed {
        /// Description of the failure
        message: String,
        /// When the upload resolved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The "now playing" selection changed in the catalog store
    CurrentSongChanged {
        /// Newly selected song (None when playback selection was cleared)
        song: Option<SongCatalogEntry>,
        /// When the selection changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for client-wide events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
///
/// Receiver cleanup on drop is what keeps per-view subscriptions from
/// leaking across view remounts: a binding holds its receiver for exactly
/// as long as the view is mounted.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RhymicEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// Capacity bounds how many events a slow subscriber may lag behind
    /// before old events are dropped for it.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received. Dropping the
    /// receiver detaches the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<RhymicEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Send errors (no receivers listening) are ignored; stores emit
    /// unconditionally and do not care whether anything is watching.
    pub fn emit(&self, event: RhymicEvent) {
        let _ = self.tx.send(event);
    }

    /// Channel capacity this bus was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_CAPACITY)
    }
}
