//! Image intake module
//!
//! Three channels (drop, paste, picker) deliver images in different shapes.
//! Each adapter below translates its channel's input into a `SelectedImage`
//! and hands it to `SearchSession::set_image`; none touches session state
//! any other way. Platform translation lives in system.rs.
use tracing::debug;

use crate::state::data::{SelectedImage, UNKNOWN_MIME};
use crate::state::SearchSession;

pub mod system;

/// A file handed over by the drop or picker channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    /// MIME type the channel declares, if it knows one
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    fn into_selected(self) -> SelectedImage {
        let mime = self.declared_type.unwrap_or_else(|| UNKNOWN_MIME.to_string());
        SelectedImage::new(self.name, mime, self.bytes)
    }
}

/// One entry on the clipboard, in clipboard order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    /// MIME type of the entry (e.g., "image/png", "text/plain")
    pub kind: String,
    /// File payload, when the entry can be read as one
    pub file: Option<IncomingFile>,
}

/// Matches the `image/*` accept pattern
pub fn is_image_type(mime: &str) -> bool {
    mime.strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// Accept the first dropped file declared as an image
///
/// Returns whether the selection changed. Non-image files are ignored.
pub fn accept_dropped_files(session: &mut SearchSession, files: Vec<IncomingFile>) -> bool {
    let first_image = files.into_iter().find(|file| {
        let accepted = file.declared_type.as_deref().is_some_and(is_image_type);
        if !accepted {
            debug!(name = %file.name, declared = ?file.declared_type, "ignoring non-image drop");
        }
        accepted
    });

    match first_image {
        Some(file) => {
            session.set_image(file.into_selected());
            true
        }
        None => false,
    }
}

/// Accept the first clipboard entry whose type begins with `image`
///
/// If that entry has no file payload, or there is no image entry, the paste
/// is a no-op.
pub fn accept_pasted_items(session: &mut SearchSession, items: Vec<ClipboardItem>) -> bool {
    let Some(item) = items.into_iter().find(|item| item.kind.starts_with("image")) else {
        debug!("paste carried no image");
        return false;
    };

    match item.file {
        Some(mut file) => {
            if file.declared_type.is_none() {
                file.declared_type = Some(item.kind);
            }
            session.set_image(file.into_selected());
            true
        }
        None => {
            debug!(kind = %item.kind, "clipboard image had no file payload");
            false
        }
    }
}

/// Accept a file chosen through the picker dialog
pub fn accept_picked_file(session: &mut SearchSession, file: IncomingFile) -> bool {
    session.set_image(file.into_selected());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::SessionPhase;

    fn file(name: &str, declared: Option<&str>) -> IncomingFile {
        IncomingFile {
            name: name.to_string(),
            declared_type: declared.map(str::to_string),
            bytes: name.as_bytes().to_vec(),
        }
    }

    fn clip(kind: &str, payload: Option<IncomingFile>) -> ClipboardItem {
        ClipboardItem {
            kind: kind.to_string(),
            file: payload,
        }
    }

    #[test]
    fn test_image_type_pattern() {
        assert!(is_image_type("image/png"));
        assert!(is_image_type("image/svg+xml"));
        assert!(!is_image_type("image/"));
        assert!(!is_image_type("text/plain"));
        assert!(!is_image_type("application/octet-stream"));
    }

    #[test]
    fn test_drop_takes_first_image() {
        let mut session = SearchSession::new();
        let accepted = accept_dropped_files(
            &mut session,
            vec![
                file("notes.txt", Some("text/plain")),
                file("cat.png", Some("image/png")),
                file("dog.jpg", Some("image/jpeg")),
            ],
        );

        assert!(accepted);
        let selected = session.selected().unwrap();
        assert_eq!(selected.name, "cat.png");
        assert_eq!(selected.mime_type, "image/png");
        assert_eq!(selected.bytes(), b"cat.png");
    }

    #[test]
    fn test_drop_without_image_is_ignored() {
        let mut session = SearchSession::new();
        session.set_image(SelectedImage::new("keep.png", "image/png", vec![1]));

        let accepted = accept_dropped_files(
            &mut session,
            vec![file("archive.zip", Some("application/zip")), file("mystery", None)],
        );

        assert!(!accepted);
        assert_eq!(session.selected().unwrap().name, "keep.png");
    }

    #[test]
    fn test_paste_takes_first_image_entry() {
        let mut session = SearchSession::new();
        let accepted = accept_pasted_items(
            &mut session,
            vec![
                clip("text/plain", None),
                clip("image/png", Some(file("clipboard.png", None))),
                clip("image/jpeg", Some(file("second.jpg", None))),
            ],
        );

        assert!(accepted);
        let selected = session.selected().unwrap();
        assert_eq!(selected.name, "clipboard.png");
        assert_eq!(selected.mime_type, "image/png");
    }

    #[test]
    fn test_paste_without_payload_is_noop() {
        let mut session = SearchSession::new();
        let accepted = accept_pasted_items(
            &mut session,
            vec![
                clip("image/png", None),
                clip("image/jpeg", Some(file("later.jpg", None))),
            ],
        );

        assert!(!accepted);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_paste_text_only_is_noop() {
        let mut session = SearchSession::new();
        assert!(!accept_pasted_items(&mut session, vec![clip("text/plain", None)]));
        assert!(!accept_pasted_items(&mut session, Vec::new()));
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_picked_file_without_type_falls_back() {
        let mut session = SearchSession::new();
        accept_picked_file(&mut session, file("photo", None));

        assert_eq!(session.selected().unwrap().mime_type, UNKNOWN_MIME);
        assert_eq!(session.phase(), SessionPhase::ImageReady);
    }

    #[test]
    fn test_mixed_channels_keep_last_accepted() {
        let mut session = SearchSession::new();

        accept_picked_file(&mut session, file("picked.png", Some("image/png")));
        accept_dropped_files(&mut session, vec![file("doc.pdf", Some("application/pdf"))]);
        accept_pasted_items(&mut session, vec![clip("text/plain", None)]);
        assert_eq!(session.selected().unwrap().name, "picked.png");

        accept_pasted_items(
            &mut session,
            vec![clip("image/png", Some(file("pasted.png", None)))],
        );
        accept_dropped_files(&mut session, vec![file("notes.md", Some("text/markdown"))]);

        assert_eq!(session.selected().unwrap().name, "pasted.png");
        assert_eq!(session.preview_slot().live_handles(), 1);
    }
}
