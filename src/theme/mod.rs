pub mod portable_text;
pub mod renderer;

pub use portable_text::PortableTextRenderer;
pub use renderer::ThemeRenderer;
