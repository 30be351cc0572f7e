pub mod config;
pub mod portable_text;
pub mod types;

pub use config::Config;
pub use portable_text::Block;
pub use types::{ContentRecord, Metadata, OpenGraph, OpenGraphImage, PageSlug, PathDescriptor};
