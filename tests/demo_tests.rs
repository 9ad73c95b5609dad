use pptx_slides::demos::{BODY_TEXT, TITLE_TEXT};
use pptx_slides::{Color, DemoConfig, Error, Presentation, SlideDemos};
use std::error::Error as _;
use std::fs;
use std::path::Path;

fn config_in(root: &Path) -> DemoConfig {
    DemoConfig::builder()
        .new_docs_dir(root.join("Presentations").join("New"))
        .existing_docs_dir(root.join("Presentations").join("Existing"))
        .build()
}

#[test]
fn test_runner_prepares_scratch_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    fs::create_dir_all(&config.new_docs_dir).unwrap();
    fs::write(config.new_document(), b"stale").unwrap();

    let demos = SlideDemos::new(config.clone()).unwrap();
    assert_eq!(demos.workspace().deleted, vec![config.new_document()]);
    assert!(!config.new_document().exists());
}

#[test]
fn test_new_presentation_walkthrough() {
    let tmp = tempfile::tempdir().unwrap();
    let demos = SlideDemos::new(config_in(tmp.path())).unwrap();

    demos.create_new_slide_in_new_presentation().unwrap();

    let presentation = Presentation::open(demos.config().new_document()).unwrap();
    assert_eq!(presentation.slide_count(), 1);
    let slide = &presentation.slides()[0];
    assert_eq!(slide.background_color(), Some(Color::SILVER));
    assert_eq!(slide.text_shapes()[0].text, TITLE_TEXT);
    assert_eq!(slide.text_shapes()[1].text, BODY_TEXT);
}

#[test]
fn test_existing_presentation_walkthroughs() {
    let tmp = tempfile::tempdir().unwrap();
    let demos = SlideDemos::new(config_in(tmp.path())).unwrap();
    let existing = demos.config().existing_document();

    assert!(demos.ensure_existing_document().unwrap());
    assert!(!demos.ensure_existing_document().unwrap());
    assert_eq!(Presentation::open(&existing).unwrap().slide_count(), 2);

    demos.create_new_slide_in_existing_presentation().unwrap();
    assert_eq!(Presentation::open(&existing).unwrap().slide_count(), 3);

    demos.remove_slide_in_existing_presentation().unwrap();
    let presentation = Presentation::open(&existing).unwrap();
    assert_eq!(presentation.slide_count(), 2);
    assert_eq!(presentation.slides()[0].text_shapes()[0].text, "Agenda");

    let before = fs::read(&existing).unwrap();
    demos.set_dimensions_of_slides().unwrap();
    assert_eq!(fs::read(&existing).unwrap(), before);
    let presentation = Presentation::open(&existing).unwrap();
    assert_eq!(presentation.slide_count(), 2);
    assert_eq!(presentation.slide_width(), 720.0);
    assert_eq!(presentation.slide_height(), 540.0);

    demos.add_background_color_to_existing_slide().unwrap();
    let presentation = Presentation::open(&existing).unwrap();
    let first = &presentation.slides()[0];
    assert_eq!(first.background_color(), Some(Color::FUCHSIA));
    assert_eq!(first.text_shapes().len(), 2);
}

#[test]
fn test_run_all_from_fresh_checkout() {
    let tmp = tempfile::tempdir().unwrap();
    let demos = SlideDemos::new(config_in(tmp.path())).unwrap();

    demos.run_all().unwrap();
    assert!(demos.config().new_document().exists());
    assert_eq!(Presentation::open(demos.config().existing_document()).unwrap().slide_count(), 2);
}

#[test]
fn test_dimensions_walkthrough_leaves_missing_deck_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let config = DemoConfig::builder()
        .new_docs_dir(tmp.path().join("new"))
        .existing_docs_dir(tmp.path().join("missing"))
        .build();
    let demos = SlideDemos::new(config).unwrap();

    demos.set_dimensions_of_slides().unwrap();
    assert!(!demos.config().existing_docs_dir.exists());
}

#[test]
fn test_invalid_path_surfaces_wrapped_error() {
    let tmp = tempfile::tempdir().unwrap();
    let config = DemoConfig::builder()
        .new_docs_dir(tmp.path().join("new"))
        .existing_docs_dir(tmp.path().join("does").join("not").join("exist"))
        .build();
    let demos = SlideDemos::new(config).unwrap();

    let err = demos.remove_slide_in_existing_presentation().unwrap_err();
    assert_eq!(err.to_string(), "An error occurred.");
    assert!(matches!(err.cause(), Error::Io(_)));
    assert!(err.source().is_some());
}

#[test]
fn test_out_of_range_slide_is_wrapped() {
    let tmp = tempfile::tempdir().unwrap();
    let demos = SlideDemos::new(config_in(tmp.path())).unwrap();
    let existing = demos.config().existing_document();
    fs::create_dir_all(existing.parent().unwrap()).unwrap();
    Presentation::create(&existing).unwrap();

    let err = demos.add_background_color_to_existing_slide().unwrap_err();
    assert!(matches!(err.into_cause(), Error::SlideNotFound(0)));
}
