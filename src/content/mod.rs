//! Content module - markdown documents, front-matter and rendering

mod document;
mod error;
mod frontmatter;
pub mod loader;
mod markdown;

pub use document::{Document, RenderedDocument, Section};
pub use error::ContentError;
pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::ContentLoader;
pub use markdown::{sanitize, MarkdownRenderer};
