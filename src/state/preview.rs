//! On-screen preview of the selected image
//!
//! The slot owns at most one live handle. Replacing or clearing it releases
//! the previous handle so repeated selections do not pile up decoded images.
use iced::widget::image::Handle;
use tracing::debug;

use super::data::SelectedImage;

/// A displayable reference to the selected image's bytes
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    /// Monotonic id, unique within the slot that issued it
    pub id: u64,
    handle: Handle,
}

impl PreviewHandle {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// Holds the current preview and tracks issued/released handles
#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Option<PreviewHandle>,
    issued: u64,
    released: u64,
}

impl PreviewSlot {
    /// Release the current preview (if any) and create one for `image`
    pub fn regenerate(&mut self, image: &SelectedImage) -> &PreviewHandle {
        self.release();

        self.issued += 1;
        let preview = PreviewHandle {
            id: self.issued,
            handle: Handle::from_bytes(image.payload()),
        };
        debug!(id = preview.id, name = %image.name, live = self.live_handles(), "preview created");

        self.current.insert(preview)
    }

    /// Drop the current preview
    pub fn release(&mut self) {
        if let Some(old) = self.current.take() {
            self.released += 1;
            debug!(id = old.id, "preview released");
        }
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    /// Handles issued and not yet released (0 or 1)
    pub fn live_handles(&self) -> u64 {
        self.issued - self.released
    }
}
