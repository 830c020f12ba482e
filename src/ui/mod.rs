//! Presentation helpers
//!
//! - Result URL resolution and thumbnail tiles (gallery.rs)

pub mod gallery;
