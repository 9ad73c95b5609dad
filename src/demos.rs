//! Walkthroughs of the slide API: each procedure opens or creates a deck,
//! applies a few edits and saves it.

use crate::workspace::{prepare_workspace, WorkspaceReport};
use crate::{Color, DemoConfig, Error, Presentation, Slide, TextShape};
use std::fs;
use std::io;
use tracing::{error, info};

pub const TITLE_TEXT: &str = "Title: Here is my first title From FF";
pub const BODY_TEXT: &str = "Body : Here is my first title From FF";
/// Vertical offset of the body shape, in percent of the slide height.
pub const BODY_Y: f64 = 25.9;

/// Error returned by every walkthrough. The failing library call is its source.
#[derive(Debug, thiserror::Error)]
#[error("An error occurred.")]
pub struct DemoError {
    #[source]
    source: Error,
}

impl DemoError {
    /// The library error that made the walkthrough fail.
    pub fn cause(&self) -> &Error {
        &self.source
    }

    pub fn into_cause(self) -> Error {
        self.source
    }
}

/// Runs the slide walkthroughs against the directories of a [`DemoConfig`].
#[derive(Debug)]
pub struct SlideDemos {
    config: DemoConfig,
    workspace: WorkspaceReport,
}

impl SlideDemos {
    /// Prepares the scratch directory and returns the runner.
    ///
    /// # Errors
    ///
    /// I/O failures of the workspace preparation are returned unwrapped.
    pub fn new(config: DemoConfig) -> io::Result<Self> {
        let workspace = prepare_workspace(&config.new_docs_dir)?;
        Ok(Self { config, workspace })
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// What the workspace preparation did.
    pub fn workspace(&self) -> &WorkspaceReport {
        &self.workspace
    }

    /// Creates a new deck with one silver slide holding a title and a body.
    pub fn create_new_slide_in_new_presentation(&self) -> Result<(), DemoError> {
        run("create_new_slide_in_new_presentation", || {
            let mut presentation = Presentation::create(self.config.new_document())?;
            presentation.append_slide(sample_slide())?;
            presentation.save()
        })
    }

    /// Appends the same slide to the existing deck.
    pub fn create_new_slide_in_existing_presentation(&self) -> Result<(), DemoError> {
        run("create_new_slide_in_existing_presentation", || {
            let mut presentation = Presentation::open(self.config.existing_document())?;
            presentation.append_slide(sample_slide())?;
            presentation.save()
        })
    }

    /// Removes the first slide of the existing deck.
    pub fn remove_slide_in_existing_presentation(&self) -> Result<(), DemoError> {
        run("remove_slide_in_existing_presentation", || {
            let mut presentation = Presentation::open(self.config.existing_document())?;
            presentation.remove_slide(0)?;
            presentation.save()
        })
    }

    /// Placeholder walkthrough for slide dimensions. It touches no file and
    /// always succeeds; resizing is done with [`Presentation::set_slide_width`]
    /// and [`Presentation::set_slide_height`].
    pub fn set_dimensions_of_slides(&self) -> Result<(), DemoError> {
        run("set_dimensions_of_slides", || Ok(()))
    }

    /// Gives the first slide of the existing deck a fuchsia background.
    pub fn add_background_color_to_existing_slide(&self) -> Result<(), DemoError> {
        run("add_background_color_to_existing_slide", || {
            let mut presentation = Presentation::open(self.config.existing_document())?;
            let slide = presentation.slide_mut(0)?;
            slide.set_background_color(Color::FUCHSIA);
            slide.update()?;
            presentation.save()
        })
    }

    /// Writes a two-slide deck to the existing document path unless a file is
    /// already there. Returns whether a deck was written.
    pub fn ensure_existing_document(&self) -> Result<bool, DemoError> {
        let path = self.config.existing_document();
        if path.exists() {
            return Ok(false);
        }

        run("ensure_existing_document", || {
            fs::create_dir_all(&self.config.existing_docs_dir)?;
            let mut presentation = Presentation::create(&path)?;

            let mut cover = Slide::new();
            cover.set_background_color(Color::NAVY);
            cover.add_text_shape(TextShape::new("Existing deck"));
            presentation.append_slide(cover)?;

            let mut agenda = Slide::new();
            agenda.add_text_shapes([
                TextShape::new("Agenda"),
                TextShape::new("Open\nEdit\nSave").with_position(5.0, BODY_Y),
            ]);
            presentation.append_slide(agenda)?;

            presentation.save()
        })?;
        info!(path = %path.display(), "seeded existing presentation");
        Ok(true)
    }

    /// Seeds the existing deck if needed, then runs every walkthrough in order.
    pub fn run_all(&self) -> Result<(), DemoError> {
        self.ensure_existing_document()?;
        self.create_new_slide_in_new_presentation()?;
        self.create_new_slide_in_existing_presentation()?;
        self.remove_slide_in_existing_presentation()?;
        self.set_dimensions_of_slides()?;
        self.add_background_color_to_existing_slide()
    }
}

/// The slide every "create" walkthrough appends.
pub fn sample_slide() -> Slide {
    let mut slide = Slide::new();
    slide.set_background_color(Color::SILVER);
    slide.add_text_shapes([
        TextShape::new(TITLE_TEXT),
        TextShape::new(BODY_TEXT).with_position(TextShape::default().x, BODY_Y),
    ]);
    slide
}

fn run<F>(procedure: &str, f: F) -> Result<(), DemoError>
where
    F: FnOnce() -> crate::Result<()>,
{
    match f() {
        Ok(()) => {
            info!(procedure, "finished");
            Ok(())
        }
        Err(source) => {
            error!(procedure, error = %source, "failed");
            Err(DemoError { source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_sample_slide_layout() {
        let slide = sample_slide();
        assert_eq!(slide.background_color(), Some(Color::SILVER));
        let shapes = slide.text_shapes();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].text, TITLE_TEXT);
        assert_eq!(shapes[1].text, BODY_TEXT);
        assert_eq!(shapes[1].y, BODY_Y);
    }

    #[test]
    fn test_run_wraps_library_errors() {
        let err = run("failing", || Err(Error::SlideNotFound(4))).unwrap_err();
        assert_eq!(err.to_string(), "An error occurred.");
        assert!(matches!(err.cause(), Error::SlideNotFound(4)));
        assert_eq!(err.source().unwrap().to_string(), "Slide not found at index 4");
    }
}
