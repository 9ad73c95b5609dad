use std::path::{Path, PathBuf};

/// Directory scratch documents are written to, relative to the working directory.
pub const DEFAULT_NEW_DOCS_DIR: &str = "Presentations/New";
/// Directory holding the document the "existing" walkthroughs edit.
pub const DEFAULT_EXISTING_DOCS_DIR: &str = "Presentations/Existing";
pub const DEFAULT_FILE_NAME: &str = "test.pptx";

/// Configuration options for the slide walkthroughs.
///
/// Use [`DemoConfig::builder()`] to create a configuration instance.
/// This allows you to customize only the desired fields while falling back to sensible defaults for the rest.
///
/// # Configuration Options
///
/// | Parameter | Type | Default | Description |
/// |-----------|------|---------|-------------|
/// | `new_docs_dir` | `PathBuf` | `Presentations/New` | Scratch directory, cleaned before the walkthroughs run |
/// | `existing_docs_dir` | `PathBuf` | `Presentations/Existing` | Directory of the document edited in place |
/// | `file_name` | `String` | `test.pptx` | File name used in both directories |
///
/// # Example
///
/// ```
/// use pptx_slides::DemoConfig;
///
/// let config = DemoConfig::builder()
///     .new_docs_dir("out/new")
///     .file_name("deck.pptx")
///     .build();
/// assert_eq!(config.new_document().to_str(), Some("out/new/deck.pptx"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub new_docs_dir: PathBuf,
    pub existing_docs_dir: PathBuf,
    pub file_name: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            new_docs_dir: PathBuf::from(DEFAULT_NEW_DOCS_DIR),
            existing_docs_dir: PathBuf::from(DEFAULT_EXISTING_DOCS_DIR),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl DemoConfig {
    pub fn builder() -> DemoConfigBuilder {
        DemoConfigBuilder::default()
    }

    /// Path of the document created from scratch.
    pub fn new_document(&self) -> PathBuf {
        self.new_docs_dir.join(&self.file_name)
    }

    /// Path of the document edited in place.
    pub fn existing_document(&self) -> PathBuf {
        self.existing_docs_dir.join(&self.file_name)
    }
}

/// Builder for [`DemoConfig`].
///
/// Allows setting individual configuration fields while falling back to defaults for any unspecified values
#[derive(Debug, Default)]
pub struct DemoConfigBuilder {
    new_docs_dir: Option<PathBuf>,
    existing_docs_dir: Option<PathBuf>,
    file_name: Option<String>,
}

impl DemoConfigBuilder {
    /// Sets the scratch directory for newly created documents.
    pub fn new_docs_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.new_docs_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the directory of the document edited in place.
    pub fn existing_docs_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.existing_docs_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Builds the final [`DemoConfig`] instance, applying default values for any fields that were not set.
    pub fn build(self) -> DemoConfig {
        let defaults = DemoConfig::default();
        DemoConfig {
            new_docs_dir: self.new_docs_dir.unwrap_or(defaults.new_docs_dir),
            existing_docs_dir: self.existing_docs_dir.unwrap_or(defaults.existing_docs_dir),
            file_name: self.file_name.unwrap_or(defaults.file_name),
        }
    }
}
