pub mod cli;
pub mod core;
pub mod i18n;
pub mod models;
pub mod theme;
pub mod utils;

// Re-export commonly used types and traits
pub use crate::core::fetch::{ContentSource, FetchError, FetchOptions, Perspective};
pub use crate::core::{Engine, PageOutcome};
pub use crate::models::{Config, ContentRecord, Metadata, PathDescriptor};
