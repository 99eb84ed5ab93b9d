//! # Rhymic UI state layer
//!
//! Client-side session and search-state management for the Rhymic music
//! streaming app:
//! - [`session`]: authentication store with persisted session
//! - [`search`]: catalog filtering and dropdown state
//! - [`profile`]: profile popup and avatar upload coordination
//! - [`library`]: shared catalog / "now playing" state
//! - [`api`]: authentication service interface and HTTP client
//!
//! Views read state through point-in-time snapshots and re-render on events
//! from `rhymic_common::events::EventBus`; rendering itself lives outside
//! this crate.

pub mod api;
pub mod library;
pub mod profile;
pub mod search;
pub mod session;

pub use library::CatalogStore;
pub use profile::ProfilePanel;
pub use search::{filter_catalog, DropdownState, SearchBar};
pub use session::{AuthPhase, SessionSnapshot, SessionStore};
