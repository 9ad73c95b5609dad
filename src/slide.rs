use crate::constants::{DEFAULT_SLIDE_HEIGHT_EMU, DEFAULT_SLIDE_WIDTH_EMU};
use crate::parse_xml;
use crate::template::BLANK_SLIDE_XML;
use crate::types::{Color, Relationship, TextShape};
use crate::write_xml::{patch_slide_xml, BackgroundEdit};
use crate::Result;
use tracing::debug;

/// A single slide, either freshly built or loaded from a presentation.
///
/// Setters only change the model. [`Slide::update`] renders pending changes
/// into the slide XML, and [`crate::Presentation::save`] does the same for any
/// slide that still has pending changes.
#[derive(Debug, Clone)]
pub struct Slide {
    pub(crate) part_name: Option<String>,
    pub(crate) slide_id: Option<u32>,
    pub(crate) rel_id: Option<String>,
    pub(crate) slide_size: (i64, i64),
    /// Relationships of the slide part, kept for re-binding.
    pub(crate) relationships: Vec<Relationship>,
    loaded: bool,
    xml: Option<String>,
    background: Option<Color>,
    shapes: Vec<TextShape>,
    committed_shapes: usize,
    background_edit: BackgroundEdit,
}

impl Default for Slide {
    fn default() -> Self {
        Self::new()
    }
}

impl Slide {
    /// Creates an empty slide that inherits its background from the layout.
    pub fn new() -> Self {
        Self {
            part_name: None,
            slide_id: None,
            rel_id: None,
            slide_size: (DEFAULT_SLIDE_WIDTH_EMU, DEFAULT_SLIDE_HEIGHT_EMU),
            relationships: Vec::new(),
            loaded: false,
            xml: None,
            background: None,
            shapes: Vec::new(),
            committed_shapes: 0,
            background_edit: BackgroundEdit::Keep,
        }
    }

    pub(crate) fn parse(
        xml: &[u8],
        part_name: String,
        relationships: Vec<Relationship>,
        slide_size: (i64, i64),
    ) -> Result<Slide> {
        let content = parse_xml::parse_slide_xml(xml, slide_size)?;
        let committed_shapes = content.shapes.len();

        Ok(Slide {
            part_name: Some(part_name),
            slide_id: None,
            rel_id: None,
            slide_size,
            relationships,
            loaded: true,
            xml: Some(parse_xml::xml_str(xml)?.to_string()),
            background: content.background,
            shapes: content.shapes,
            committed_shapes,
            background_edit: BackgroundEdit::Keep,
        })
    }

    /// Part name inside the package, e.g. `ppt/slides/slide1.xml`, once bound.
    pub fn part_name(&self) -> Option<&str> {
        self.part_name.as_deref()
    }

    /// Number embedded in the part name (`slide3.xml` -> 3). This is not the
    /// position in the deck.
    pub fn slide_number(&self) -> Option<u32> {
        self.part_name.as_deref().and_then(extract_slide_number)
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background = Some(color);
        self.background_edit = BackgroundEdit::Set(color);
    }

    /// Removes an explicit background so the layout's background shows again.
    pub fn clear_background_color(&mut self) {
        self.background = None;
        self.background_edit = BackgroundEdit::Clear;
    }

    pub fn add_text_shape(&mut self, shape: TextShape) {
        self.shapes.push(shape);
    }

    pub fn add_text_shapes(&mut self, shapes: impl IntoIterator<Item = TextShape>) {
        self.shapes.extend(shapes);
    }

    /// Text shapes in z-order: shapes read from the file first, then added ones.
    pub fn text_shapes(&self) -> &[TextShape] {
        &self.shapes
    }

    /// Whether changes are waiting for [`Slide::update`].
    pub fn is_modified(&self) -> bool {
        self.xml.is_none() || self.background_edit != BackgroundEdit::Keep || self.committed_shapes < self.shapes.len()
    }

    /// Rendered slide XML, if the slide has been rendered at least once.
    pub fn xml(&self) -> Option<&str> {
        self.xml.as_deref()
    }

    /// Renders pending background and shape changes into the slide XML.
    ///
    /// Content the slide already had is preserved, including shapes this crate
    /// does not model.
    pub fn update(&mut self) -> Result<()> {
        if !self.is_modified() {
            return Ok(());
        }

        let base = self.xml.as_deref().unwrap_or(BLANK_SLIDE_XML);
        let pending = &self.shapes[self.committed_shapes..];
        let rendered = patch_slide_xml(base, self.background_edit, pending, self.slide_size)?;

        debug!(
            slide = self.part_name.as_deref().unwrap_or("<unbound>"),
            new_shapes = pending.len(),
            background = ?self.background_edit,
            "slide updated"
        );

        self.xml = Some(rendered);
        self.committed_shapes = self.shapes.len();
        self.background_edit = BackgroundEdit::Keep;
        Ok(())
    }

    /// Prepares the slide for binding into a presentation with the given size.
    ///
    /// A slide that was never loaded from a file is rendered from scratch so
    /// that its shapes are placed against the target deck's dimensions.
    pub(crate) fn rebind(&mut self, slide_size: (i64, i64)) {
        self.slide_size = slide_size;
        if !self.loaded {
            self.xml = None;
            self.committed_shapes = 0;
            self.background_edit = match self.background {
                Some(color) => BackgroundEdit::Set(color),
                None => BackgroundEdit::Keep,
            };
        }
    }

    pub(crate) fn unbind(&mut self) {
        self.part_name = None;
        self.slide_id = None;
        self.rel_id = None;
    }
}

fn extract_slide_number(path: &str) -> Option<u32> {
    path.split('/')
        .last()
        .and_then(|filename| filename.strip_prefix("slide").and_then(|s| s.strip_suffix(".xml")))
        .and_then(|num_str| num_str.parse::<u32>().ok())
}
