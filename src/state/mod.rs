//! State management module
//!
//! This module handles all session state, including:
//! - Shared data structures (data.rs)
//! - The preview handle and its release rule (preview.rs)
//! - The select -> search -> results lifecycle (session.rs)

pub mod data;
pub mod preview;
pub mod session;

pub use session::{SearchCompletion, SearchSession};
