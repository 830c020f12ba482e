//! Shared data structures for the search session
//!
//! These structs represent the data model that flows between
//! the intake adapters, the search client and the UI layer.
use bytes::Bytes;

/// Fallback MIME type when an intake channel cannot tell what it holds
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// The image the user has chosen to search with
///
/// The payload is a shared `Bytes` buffer: search tickets, the upload body
/// and the preview handle all point at the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    /// Filename reported by the channel (e.g., "cat.png", "clipboard.png")
    pub name: String,
    /// Declared MIME type (e.g., "image/png")
    pub mime_type: String,
    bytes: Bytes,
}

impl SelectedImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: Bytes::from(bytes),
        }
    }

    /// Raw image payload
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap handle on the payload for consumers that take ownership
    pub fn payload(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Where the session is in its select -> search -> results cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No image selected
    #[default]
    Idle,
    /// Image selected, no request issued against it yet
    ImageReady,
    /// Request in flight
    Searching,
    /// Response received and parsed
    ResultsReady,
}

/// Ordered identifiers returned by the service
///
/// Order is display order. No sorting or de-duplication happens here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    identifiers: Vec<String>,
}

impl ResultSet {
    pub fn new(identifiers: Vec<String>) -> Self {
        Self { identifiers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn clear(&mut self) {
        self.identifiers.clear();
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[String] {
        &self.identifiers
    }
}

impl From<Vec<String>> for ResultSet {
    fn from(identifiers: Vec<String>) -> Self {
        Self::new(identifiers)
    }
}
