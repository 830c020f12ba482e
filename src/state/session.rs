use tracing::{debug, info, warn};

use super::data::{ResultSet, SelectedImage, SessionPhase};
use super::preview::{PreviewHandle, PreviewSlot};
use crate::error::{SearchError, SearchSkipped};
use crate::search::SimilarityService;

/// A request the session has agreed to issue
///
/// The generation identifies the selection the request was made against;
/// the outcome is only applied if that selection is still current.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    pub generation: u64,
    pub image: SelectedImage,
}

/// What `complete_search` did with an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCompletion {
    /// Results stored, phase is ResultsReady
    Applied,
    /// Request failed, results cleared, phase is ImageReady
    Failed(SearchError),
    /// The selection changed since the request was issued; nothing applied
    Stale,
}

/// Owns everything one search session knows about
///
/// `set_image` is the only way a selection enters the session, so every
/// intake channel goes through the same replace-and-regenerate-preview path.
#[derive(Debug, Default)]
pub struct SearchSession {
    selected: Option<SelectedImage>,
    preview: PreviewSlot,
    phase: SessionPhase,
    results: ResultSet,
    /// Bumped on every selection change and every issued request
    generation: u64,
    /// Generation of the request still on the wire, current or stale
    outstanding: Option<u64>,
    failure: Option<SearchError>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selected image
    ///
    /// Any results, failure message or in-flight request become irrelevant.
    pub fn set_image(&mut self, image: SelectedImage) {
        info!(
            name = %image.name,
            mime = %image.mime_type,
            bytes = image.size(),
            "image selected"
        );

        self.generation += 1;
        self.preview.regenerate(&image);
        self.selected = Some(image);
        self.results.clear();
        self.failure = None;
        self.phase = SessionPhase::ImageReady;
    }

    /// Drop the selection and everything derived from it
    pub fn reset(&mut self) {
        debug!("session reset");
        self.generation += 1;
        self.preview.release();
        self.selected = None;
        self.results.clear();
        self.failure = None;
        self.phase = SessionPhase::Idle;
    }

    /// Start a search against the current image
    ///
    /// Refused while any request, including a stale one, is still outstanding.
    pub fn begin_search(&mut self) -> Result<SearchTicket, SearchSkipped> {
        let Some(image) = self.selected.clone() else {
            debug!("search requested with no image selected");
            return Err(SearchSkipped::NoImageSelected);
        };
        if self.outstanding.is_some() {
            debug!(outstanding = ?self.outstanding, "search already in flight");
            return Err(SearchSkipped::AlreadySearching);
        }

        self.generation += 1;
        self.outstanding = Some(self.generation);
        self.failure = None;
        self.phase = SessionPhase::Searching;
        info!(generation = self.generation, name = %image.name, "search started");

        Ok(SearchTicket {
            generation: self.generation,
            image,
        })
    }

    /// Apply the outcome of the request issued under `generation`
    pub fn complete_search(
        &mut self,
        generation: u64,
        outcome: Result<ResultSet, SearchError>,
    ) -> SearchCompletion {
        if self.outstanding == Some(generation) {
            self.outstanding = None;
        }

        if generation != self.generation || self.phase != SessionPhase::Searching {
            debug!(generation, current = self.generation, "discarding stale response");
            return SearchCompletion::Stale;
        }

        match outcome {
            Ok(results) => {
                info!(generation, matches = results.len(), "search complete");
                self.results = results;
                self.phase = SessionPhase::ResultsReady;
                SearchCompletion::Applied
            }
            Err(err) => {
                warn!(generation, error = %err, "search failed");
                self.results.clear();
                self.failure = Some(err.clone());
                self.phase = SessionPhase::ImageReady;
                SearchCompletion::Failed(err)
            }
        }
    }

    /// Issue one search through `service` and apply its outcome
    pub async fn run_search<S: SimilarityService>(
        &mut self,
        service: &S,
    ) -> Result<SearchCompletion, SearchSkipped> {
        let ticket = self.begin_search()?;
        let outcome = service.search(&ticket.image).await;
        Ok(self.complete_search(ticket.generation, outcome))
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.current()
    }

    #[cfg(test)]
    pub fn preview_slot(&self) -> &PreviewSlot {
        &self.preview
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Failure from the most recent search, until the next selection or search
    pub fn failure(&self) -> Option<&SearchError> {
        self.failure.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.phase == SessionPhase::Searching
    }

    /// An image is selected and no request, current or stale, is on the wire
    pub fn can_search(&self) -> bool {
        self.selected.is_some() && self.outstanding.is_none()
    }

    /// A superseded request is still outstanding and holds the search slot
    pub fn awaiting_stale_response(&self) -> bool {
        self.outstanding.is_some() && !self.is_searching()
    }
}
