//! Shared catalog state
//!
//! Holds the full song catalog and the "now playing" selection. Both the
//! queue display and the search result click handler write the selection
//! through [`CatalogStore::set_current_song`], keeping a single source of
//! truth for what is playing.
//!
//! Uses RwLock for concurrent read access with rare writes.

use rhymic_common::events::{EventBus, RhymicEvent};
use rhymic_common::SongCatalogEntry;
use tokio::sync::RwLock;
use tracing::debug;

/// Catalog and playback-selection state shared across views
pub struct CatalogStore {
    /// Full set of known songs, in catalog order
    songs: RwLock<Vec<SongCatalogEntry>>,
    /// Currently playing song (None when nothing is selected)
    current_song: RwLock<Option<SongCatalogEntry>>,
    event_bus: EventBus,
}

impl CatalogStore {
    /// Create an empty catalog store
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            songs: RwLock::new(Vec::new()),
            current_song: RwLock::new(None),
            event_bus,
        }
    }

    /// Replace the full catalog
    pub async fn set_songs(&self, songs: Vec<SongCatalogEntry>) {
        debug!(count = songs.len(), "catalog replaced");
        *self.songs.write().await = songs;
    }

    /// Copy of the full catalog, in catalog order
    pub async fn songs(&self) -> Vec<SongCatalogEntry> {
        self.songs.read().await.clone()
    }

    /// Currently selected song, if any
    pub async fn current_song(&self) -> Option<SongCatalogEntry> {
        self.current_song.read().await.clone()
    }

    /// Set the "now playing" selection and notify subscribers
    pub async fn set_current_song(&self, song: Option<SongCatalogEntry>) {
        {
            let mut current = self.current_song.write().await;
            *current = song.clone();
        }
        self.event_bus.emit(RhymicEvent::CurrentSongChanged {
            song,
            timestamp: chrono::Utc::now(),
        });
    }
}
