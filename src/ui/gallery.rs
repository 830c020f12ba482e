//! Result presentation
//!
//! Maps server identifiers to display URLs and holds the thumbnail tiles
//! for the current result set. Tiles are tagged with the session generation
//! they were built for; loads for any other generation are dropped.
use iced::widget::image::Handle;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::state::data::ResultSet;

/// Fixed location result images are served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBase {
    base: String,
}

impl MediaBase {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Display URL for a server identifier
    ///
    /// Only the final path segment of the identifier is trusted.
    pub fn resolve_display_url(&self, identifier: &str) -> String {
        let basename = identifier.rsplit('/').next().unwrap_or(identifier);
        format!("{}/{}", self.base, basename)
    }

    /// Display URLs for a whole result set, in result order
    pub fn resolve_all(&self, results: &ResultSet) -> Vec<String> {
        results
            .iter()
            .map(|identifier| self.resolve_display_url(identifier))
            .collect()
    }
}

/// Loading state of one result thumbnail
#[derive(Debug, Clone)]
pub enum TileImage {
    Loading,
    Loaded(Handle),
    Failed,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub url: String,
    pub image: TileImage,
}

/// Thumbnails for the result set of one generation
#[derive(Debug, Default)]
pub struct ResultGallery {
    generation: u64,
    tiles: Vec<Tile>,
}

impl ResultGallery {
    /// Build tiles in result order; returns `(index, url)` pairs to fetch
    pub fn populate(
        &mut self,
        generation: u64,
        results: &ResultSet,
        media: &MediaBase,
    ) -> Vec<(usize, String)> {
        self.generation = generation;
        self.tiles = media
            .resolve_all(results)
            .into_iter()
            .map(|url| Tile {
                url,
                image: TileImage::Loading,
            })
            .collect();

        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (index, tile.url.clone()))
            .collect()
    }

    /// Store a finished thumbnail load, unless it belongs to another generation
    pub fn apply(&mut self, generation: u64, index: usize, outcome: Result<Vec<u8>, SearchError>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale thumbnail");
            return;
        }
        let Some(tile) = self.tiles.get_mut(index) else {
            return;
        };

        tile.image = match outcome {
            Ok(bytes) => TileImage::Loaded(Handle::from_bytes(bytes)),
            Err(err) => {
                warn!(url = %tile.url, error = %err, "thumbnail failed to load");
                TileImage::Failed
            }
        };
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}

/// Download one result image
pub async fn fetch_image(http: Client, url: String) -> Result<Vec<u8>, SearchError> {
    let response = http.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status(status.as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}
