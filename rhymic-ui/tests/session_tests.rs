//! Session store behavior tests
//!
//! Drives the store against a scripted mock service and in-memory storage:
//! login/logout lifecycle, error visibility, avatar upload handling,
//! persistence round-trip and the superseded-response guard.

use async_trait::async_trait;
use rhymic_common::api::LoginResponse;
use rhymic_common::events::EventBus;
use rhymic_common::UserProfile;
use rhymic_ui::api::{ApiError, AuthApi, AvatarImage};
use rhymic_ui::session::{MemoryStorage, SessionStorage, SessionStore, KEY_TOKEN, KEY_USER};
use rhymic_ui::AuthPhase;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ========================================
// Mock service
// ========================================

type ScriptedLogin = (Option<Arc<Notify>>, Result<LoginResponse, ApiError>);

/// Scripted authentication service
///
/// Login responses are consumed front-to-back; a response carrying a Notify
/// gate is held back until the test releases it, which lets tests resolve
/// overlapping attempts in a chosen order.
#[derive(Default)]
struct MockAuthApi {
    login_script: Mutex<VecDeque<ScriptedLogin>>,
    signup_script: Mutex<VecDeque<Result<(), ApiError>>>,
    avatar_script: Mutex<VecDeque<Result<String, ApiError>>>,
    login_calls: AtomicUsize,
    signup_calls: AtomicUsize,
    avatar_calls: AtomicUsize,
}

impl MockAuthApi {
    fn push_login(&self, gate: Option<Arc<Notify>>, result: Result<LoginResponse, ApiError>) {
        self.login_script.lock().unwrap().push_back((gate, result));
    }

    fn push_signup(&self, result: Result<(), ApiError>) {
        self.signup_script.lock().unwrap().push_back(result);
    }

    fn push_avatar(&self, result: Result<String, ApiError>) {
        self.avatar_script.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let (gate, result) = self
            .login_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted login call");
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn signup(&self, _name: &str, _email: &str, _password: &str) -> Result<(), ApiError> {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
        self.signup_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted signup call")
    }

    async fn upload_avatar(&self, _token: &str, _image: AvatarImage) -> Result<String, ApiError> {
        self.avatar_calls.fetch_add(1, Ordering::SeqCst);
        self.avatar_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted avatar call")
    }
}

/// Storage whose first write parks on a gate until the test releases it
///
/// Lets a test hold a login attempt inside its persist step while other
/// attempts run, to exercise the window between a response resolving and
/// its session being applied.
struct GatedStorage {
    inner: MemoryStorage,
    gate: Arc<Notify>,
    put_calls: AtomicUsize,
}

impl GatedStorage {
    fn new(gate: Arc<Notify>) -> Self {
        Self {
            inner: MemoryStorage::new(),
            gate,
            put_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionStorage for GatedStorage {
    async fn get(&self, key: &str) -> rhymic_common::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> rhymic_common::Result<()> {
        if self.put_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> rhymic_common::Result<()> {
        self.inner.remove(key).await
    }
}

fn profile(id: i64, name: &str) -> UserProfile {
    UserProfile {
        id,
        name: name.to_string(),
        email: format!("{}@example.net", name.to_lowercase()),
        profile_pic: None,
    }
}

fn login_ok(token: &str, user: UserProfile) -> Result<LoginResponse, ApiError> {
    Ok(LoginResponse {
        token: token.to_string(),
        user,
    })
}

async fn open_store(
    api: Arc<MockAuthApi>,
    storage: Arc<MemoryStorage>,
) -> SessionStore<Arc<MockAuthApi>, Arc<MemoryStorage>> {
    SessionStore::open(api, storage, EventBus::new(32))
        .await
        .unwrap()
}

// ========================================
// Login / logout
// ========================================

#[tokio::test]
async fn successful_login_sets_session_to_service_values() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));

    let store = open_store(api, Arc::clone(&storage)).await;
    assert!(store.login("ada@example.net", "pw").await);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.token.as_deref(), Some("tok-1"));
    assert_eq!(snapshot.user.as_ref().unwrap().id, 7);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.phase, AuthPhase::Authenticated);

    // Token and profile were persisted
    assert_eq!(
        storage.get(KEY_TOKEN).await.unwrap().as_deref(),
        Some("tok-1")
    );
    assert!(storage.get(KEY_USER).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_login_sets_error_and_leaves_session_untouched() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    api.push_login(
        None,
        Err(ApiError::Rejected {
            status: 401,
            message: Some("Invalid".to_string()),
        }),
    );

    let store = open_store(api, storage).await;
    assert!(!store.login("ada@example.net", "wrong").await);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.error.as_deref(), Some("Invalid"));
    assert_eq!(snapshot.token, None);
    assert_eq!(snapshot.user, None);
    assert_eq!(snapshot.phase, AuthPhase::Anonymous);
}

#[tokio::test]
async fn failed_relogin_keeps_existing_session() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));
    api.push_login(None, Err(ApiError::Network("connection refused".to_string())));

    let store = open_store(api, storage).await;
    assert!(store.login("ada@example.net", "pw").await);
    assert!(!store.login("ada@example.net", "pw").await);

    let snapshot = store.snapshot().await;
    // The network error's description is surfaced; the session survives
    assert_eq!(snapshot.error.as_deref(), Some("connection refused"));
    assert_eq!(snapshot.token.as_deref(), Some("tok-1"));
    assert_eq!(snapshot.phase, AuthPhase::Authenticated);
}

#[tokio::test]
async fn rejection_without_message_uses_generic_fallback() {
    let api = Arc::new(MockAuthApi::default());
    api.push_login(
        None,
        Err(ApiError::Rejected {
            status: 500,
            message: None,
        }),
    );

    let store = open_store(api, Arc::new(MemoryStorage::new())).await;
    assert!(!store.login("ada@example.net", "pw").await);
    assert_eq!(
        store.snapshot().await.error.as_deref(),
        Some("Login failed due to an unknown error.")
    );
}

#[tokio::test]
async fn new_attempt_clears_prior_error() {
    let api = Arc::new(MockAuthApi::default());
    api.push_login(
        None,
        Err(ApiError::Rejected {
            status: 401,
            message: Some("Invalid".to_string()),
        }),
    );
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));

    let store = open_store(api, Arc::new(MemoryStorage::new())).await;
    assert!(!store.login("ada@example.net", "wrong").await);
    assert!(store.snapshot().await.error.is_some());

    assert!(store.login("ada@example.net", "pw").await);
    assert_eq!(store.snapshot().await.error, None);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));

    let store = open_store(api, Arc::clone(&storage)).await;
    assert!(store.login("ada@example.net", "pw").await);

    store.logout().await;
    let first = store.snapshot().await;
    assert_eq!(first.phase, AuthPhase::Anonymous);
    assert_eq!(first.token, None);
    assert_eq!(first.user, None);
    assert_eq!(first.error, None);
    assert_eq!(storage.get(KEY_TOKEN).await.unwrap(), None);
    assert_eq!(storage.get(KEY_USER).await.unwrap(), None);

    // Second logout leaves state identical
    store.logout().await;
    let second = store.snapshot().await;
    assert_eq!(second.phase, AuthPhase::Anonymous);
    assert_eq!(second.token, None);
    assert_eq!(second.user, None);
    assert_eq!(second.error, None);
}

// ========================================
// Signup
// ========================================

#[tokio::test]
async fn signup_never_mutates_session() {
    let api = Arc::new(MockAuthApi::default());
    api.push_signup(Ok(()));
    api.push_signup(Err(ApiError::Rejected {
        status: 400,
        message: Some("Email already registered".to_string()),
    }));

    let store = open_store(api, Arc::new(MemoryStorage::new())).await;

    assert!(store.signup("Ada", "ada@example.net", "pw").await);
    let after_success = store.snapshot().await;
    assert_eq!(after_success.user, None);
    assert_eq!(after_success.token, None);
    assert_eq!(after_success.error, None);

    assert!(!store.signup("Ada", "ada@example.net", "pw").await);
    let after_failure = store.snapshot().await;
    assert_eq!(after_failure.user, None);
    assert_eq!(after_failure.token, None);
    assert_eq!(
        after_failure.error.as_deref(),
        Some("Email already registered")
    );
}

// ========================================
// Avatar upload
// ========================================

#[tokio::test]
async fn avatar_upload_without_token_makes_no_network_call() {
    let api = Arc::new(MockAuthApi::default());
    let store = open_store(Arc::clone(&api), Arc::new(MemoryStorage::new())).await;

    let ok = store
        .update_avatar(AvatarImage {
            file_name: "me.jpg".to_string(),
            bytes: vec![0xFF, 0xD8],
        })
        .await;

    assert!(!ok);
    assert_eq!(api.avatar_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn avatar_upload_merges_and_repersists_profile() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));
    api.push_avatar(Ok("/assets/profiles/user_7_1730.jpg".to_string()));

    let store = open_store(api, Arc::clone(&storage)).await;
    assert!(store.login("ada@example.net", "pw").await);

    let ok = store
        .update_avatar(AvatarImage {
            file_name: "me.jpg".to_string(),
            bytes: vec![0xFF, 0xD8],
        })
        .await;
    assert!(ok);

    let snapshot = store.snapshot().await;
    let user = snapshot.user.unwrap();
    assert_eq!(
        user.profile_pic.as_deref(),
        Some("/assets/profiles/user_7_1730.jpg")
    );
    // Only profile_pic changed
    assert_eq!(user.id, 7);
    assert_eq!(user.name, "Ada");

    // The full profile was re-persisted with the merged path
    let persisted = storage.get(KEY_USER).await.unwrap().unwrap();
    let persisted: UserProfile = serde_json::from_str(&persisted).unwrap();
    assert_eq!(
        persisted.profile_pic.as_deref(),
        Some("/assets/profiles/user_7_1730.jpg")
    );
}

#[tokio::test]
async fn avatar_failure_sets_distinct_error_field() {
    let api = Arc::new(MockAuthApi::default());
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));
    api.push_avatar(Err(ApiError::Rejected {
        status: 500,
        message: None,
    }));

    let store = open_store(api, Arc::new(MemoryStorage::new())).await;
    assert!(store.login("ada@example.net", "pw").await);

    let ok = store
        .update_avatar(AvatarImage {
            file_name: "me.jpg".to_string(),
            bytes: vec![0xFF, 0xD8],
        })
        .await;
    assert!(!ok);

    let snapshot = store.snapshot().await;
    assert!(snapshot.avatar_error.is_some());
    // The shared auth error field stays untouched and the session survives
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.token.as_deref(), Some("tok-1"));
    assert_eq!(snapshot.user.unwrap().profile_pic, None);
}

// ========================================
// Persistence round-trip
// ========================================

#[tokio::test]
async fn rehydration_reproduces_persisted_session() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    api.push_login(None, login_ok("tok-1", profile(7, "Ada")));

    let store = open_store(Arc::clone(&api), Arc::clone(&storage)).await;
    assert!(store.login("ada@example.net", "pw").await);
    drop(store);

    // Simulated fresh process start over the same storage
    let rehydrated = open_store(api, storage).await;
    let snapshot = rehydrated.snapshot().await;
    assert_eq!(snapshot.token.as_deref(), Some("tok-1"));
    assert_eq!(snapshot.user.as_ref().unwrap().name, "Ada");
    assert_eq!(snapshot.phase, AuthPhase::Authenticated);
}

#[tokio::test]
async fn undecodable_persisted_profile_starts_anonymous() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());
    storage.put(KEY_TOKEN, "tok-stale").await.unwrap();
    storage.put(KEY_USER, "{not json").await.unwrap();

    let store = open_store(api, storage).await;
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.user, None);
    assert_eq!(snapshot.phase, AuthPhase::Anonymous);
}

// ========================================
// Overlapping attempts
// ========================================

#[tokio::test]
async fn superseded_login_response_is_discarded() {
    let api = Arc::new(MockAuthApi::default());
    let storage = Arc::new(MemoryStorage::new());

    // The first attempt's response is gated so it resolves after the second
    // attempt has already completed
    let gate = Arc::new(Notify::new());
    api.push_login(Some(Arc::clone(&gate)), login_ok("tok-stale", profile(1, "Old")));
    api.push_login(None, login_ok("tok-fresh", profile(2, "New")));

    let store = Arc::new(open_store(Arc::clone(&api), storage).await);

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.login("a@example.net", "pw").await })
    };
    // Let the first attempt reach its in-flight await
    while api.login_calls.load(Ordering::SeqCst) < 1 {
        tokio::task::yield_now().await;
    }

    assert!(store.login("b@example.net", "pw").await);
    gate.notify_one();

    // The stale response must not overwrite the newer session
    assert!(!first.await.unwrap());
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.token.as_deref(), Some("tok-fresh"));
    assert_eq!(snapshot.user.unwrap().id, 2);
}

#[tokio::test]
async fn login_parked_in_persist_cannot_lose_to_an_older_attempt() {
    let api = Arc::new(MockAuthApi::default());
    api.push_login(None, login_ok("tok-stale", profile(1, "Old")));
    api.push_login(None, login_ok("tok-fresh", profile(2, "New")));

    // The first attempt's response resolves immediately but its persist
    // step parks on the gated storage write
    let gate = Arc::new(Notify::new());
    let storage = Arc::new(GatedStorage::new(Arc::clone(&gate)));
    let store = Arc::new(
        SessionStore::open(api, Arc::clone(&storage), EventBus::new(32))
            .await
            .unwrap(),
    );

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.login("a@example.net", "pw").await })
    };
    // Let the first attempt reach its parked storage write
    while storage.put_calls.load(Ordering::SeqCst) < 1 {
        tokio::task::yield_now().await;
    }

    // Start a second attempt while the first is parked mid-persist
    let second = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.login("b@example.net", "pw").await })
    };
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    first.await.unwrap();
    assert!(second.await.unwrap());

    // The later attempt's session wins, in memory and in storage alike
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.token.as_deref(), Some("tok-fresh"));
    assert_eq!(snapshot.user.unwrap().id, 2);
    assert_eq!(
        storage.get(KEY_TOKEN).await.unwrap().as_deref(),
        Some("tok-fresh")
    );
}
