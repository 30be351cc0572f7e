pub mod engine;
pub mod fetch;
pub mod generator;
pub mod metadata;
pub mod page;
pub mod paths;
pub mod server;

pub use engine::Engine;
pub use generator::{BuildReport, HtmlGenerator};
pub use page::{PageOutcome, RenderedPage};
pub use server::Server;
