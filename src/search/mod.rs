//! Remote similarity-search contract
//!
//! This module handles:
//! - The `SimilarityService` seam the session talks to
//! - Parsing the service's JSON response
//! - The reqwest-backed client (client.rs)
use serde::Deserialize;
use std::future::Future;

use crate::error::SearchError;
use crate::state::data::{ResultSet, SelectedImage};

pub mod client;

pub use client::HttpSimilarityService;

/// Something that can answer "which images look like this one?"
///
/// The returned future is `'static` so it can be handed to `Task::perform`.
pub trait SimilarityService {
    fn search(
        &self,
        image: &SelectedImage,
    ) -> impl Future<Output = Result<ResultSet, SearchError>> + Send + 'static;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    similar_images: Vec<String>,
}

/// Parse a `/search` response body into an ordered result set
pub fn parse_search_response(body: &[u8]) -> Result<ResultSet, SearchError> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    Ok(ResultSet::new(response.similar_images))
}

/// Request-counting service for lifecycle tests
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Answers every request with a canned reply and counts the requests
    #[derive(Clone)]
    pub struct CountingService {
        calls: Arc<AtomicUsize>,
        reply: Arc<Mutex<Result<ResultSet, SearchError>>>,
    }

    impl CountingService {
        pub fn replying(reply: Result<ResultSet, SearchError>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                reply: Arc::new(Mutex::new(reply)),
            }
        }

        pub fn set_reply(&self, reply: Result<ResultSet, SearchError>) {
            *self.reply.lock().unwrap() = reply;
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SimilarityService for CountingService {
        fn search(
            &self,
            _image: &SelectedImage,
        ) -> impl Future<Output = Result<ResultSet, SearchError>> + Send + 'static {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.lock().unwrap().clone();
            async move { reply }
        }
    }
}
