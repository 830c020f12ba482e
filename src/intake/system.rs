//! Platform side of the intake channels
//!
//! Turns dropped/picked paths and the system clipboard into the plain
//! `IncomingFile` / `ClipboardItem` values the adapters understand.
use image::{ImageFormat, RgbaImage};
use rfd::FileDialog;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{ClipboardItem, IncomingFile};

/// Extensions offered by the picker dialog
const PICKER_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// Filename given to pasted clipboard images
const CLIPBOARD_NAME: &str = "clipboard.png";

/// MIME type implied by a path's extension, if it names an image format
pub fn declared_type_for(path: &Path) -> Option<String> {
    ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

/// Read a dropped or picked file from disk
pub fn read_path(path: &Path) -> std::io::Result<IncomingFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(IncomingFile {
        name,
        declared_type: declared_type_for(path),
        bytes,
    })
}

/// Read a dropped path, treating unreadable files as "nothing dropped"
pub fn read_dropped_path(path: &Path) -> Vec<IncomingFile> {
    match read_path(path) {
        Ok(file) => vec![file],
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read dropped file");
            Vec::new()
        }
    }
}

/// Show the native picker dialog
pub fn pick_image_file() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Choose an Image")
        .add_filter("Images", &PICKER_EXTENSIONS)
        .pick_file()
}

/// Snapshot the system clipboard as an ordered list of entries
///
/// An image entry (re-encoded as PNG) comes first, then a text entry.
pub fn read_clipboard() -> Vec<ClipboardItem> {
    let mut clipboard = match arboard::Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(err) => {
            warn!(error = %err, "clipboard unavailable");
            return Vec::new();
        }
    };

    let mut items = Vec::new();

    if let Ok(data) = clipboard.get_image() {
        let payload = encode_png(data.width, data.height, data.bytes.into_owned());
        if payload.is_none() {
            debug!("clipboard image could not be encoded");
        }
        items.push(ClipboardItem {
            kind: ImageFormat::Png.to_mime_type().to_string(),
            file: payload.map(|bytes| IncomingFile {
                name: CLIPBOARD_NAME.to_string(),
                declared_type: Some(ImageFormat::Png.to_mime_type().to_string()),
                bytes,
            }),
        });
    }

    if clipboard.get_text().is_ok() {
        items.push(ClipboardItem {
            kind: "text/plain".to_string(),
            file: None,
        });
    }

    items
}

/// Encode raw RGBA pixels as a PNG file
fn encode_png(width: usize, height: usize, rgba: Vec<u8>) -> Option<Vec<u8>> {
    let width = u32::try_from(width).ok()?;
    let height = u32::try_from(height).ok()?;
    let pixels = RgbaImage::from_raw(width, height, rgba)?;
    let mut png = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .ok()?;
    Some(png)
}
