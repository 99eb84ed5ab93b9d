//! # Rhymic Common Library
//!
//! Shared code for the Rhymic client modules including:
//! - Session and catalog data types
//! - HTTP API request/response types
//! - Event types (RhymicEvent enum) and EventBus
//! - Configuration loading
//! - Common error type

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::{SongCatalogEntry, UserProfile};
