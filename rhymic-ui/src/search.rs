//! Search index filter and dropdown state
//!
//! Filtering is a pure function of the live query and the catalog; results
//! are derived on demand, never stored. The dropdown visibility machine is
//! `Closed -> Open` on focus and `Open -> Closed` on an outside
//! pointer-down, with `Open` split by whether any results match.

use crate::library::CatalogStore;
use rhymic_common::SongCatalogEntry;
use tracing::debug;

/// Filter the catalog against a live query string
///
/// Case-insensitive substring match on title OR artist, preserving catalog
/// order (no ranking). An empty or whitespace-only query yields an empty
/// result set: nothing is shown until the user types.
pub fn filter_catalog(query: &str, catalog: &[SongCatalogEntry]) -> Vec<SongCatalogEntry> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|song| {
            song.title.to_lowercase().contains(&needle)
                || song.artist.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Search dropdown visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    /// Input not focused; nothing shown
    Closed,
    /// Focused, but the current query matches nothing (or is blank)
    OpenEmpty,
    /// Focused with at least one matching song
    OpenResults,
}

/// Search bar state: the live query plus focus
///
/// Results are not a field here; they are recomputed from the query and the
/// catalog whenever the UI asks.
#[derive(Debug, Default)]
pub struct SearchBar {
    query: String,
    focused: bool,
}

impl SearchBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Update the query (a keystroke)
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Focus the search input, opening the dropdown
    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Outside pointer-down while open: close the dropdown
    ///
    /// The query is kept; only visibility changes.
    pub fn dismiss(&mut self) {
        self.focused = false;
    }

    /// Derived result list for the current query
    pub fn results(&self, catalog: &[SongCatalogEntry]) -> Vec<SongCatalogEntry> {
        filter_catalog(&self.query, catalog)
    }

    /// Current dropdown visibility for the given catalog
    pub fn dropdown_state(&self, catalog: &[SongCatalogEntry]) -> DropdownState {
        if !self.focused {
            return DropdownState::Closed;
        }
        if self.results(catalog).is_empty() {
            DropdownState::OpenEmpty
        } else {
            DropdownState::OpenResults
        }
    }

    /// Select a result: set it as the current song, clear the query and
    /// close the dropdown
    ///
    /// The query reset and the close happen in the same mutation, so no
    /// intermediate render can observe stale results.
    pub async fn select(&mut self, song: SongCatalogEntry, catalog: &CatalogStore) {
        debug!(song_id = song.id, title = %song.title, "search result selected");
        catalog.set_current_song(Some(song)).await;
        self.query.clear();
        self.focused = false;
    }
}
