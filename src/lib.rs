mod constants;
mod container;
mod content_types;
mod demo_config;
mod parse_rels;
mod parse_xml;
mod slide;
mod template;
mod types;
mod write_xml;

pub mod demos;
pub mod workspace;

pub use container::Presentation;
pub use demo_config::{DemoConfig, DemoConfigBuilder};
pub use demos::{DemoError, SlideDemos};
pub use slide::Slide;
pub use types::*;
pub use workspace::{prepare_workspace, WorkspaceReport};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Slide not found at index {0}")]
    SlideNotFound(usize),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Invalid slide dimension: {0} pt")]
    InvalidDimension(f64),

    #[error("No free slide id left")]
    SlideIdsExhausted,
}

pub type Result<T> = std::result::Result<T, Error>;
