//! Minimal templates for a brand new presentation.
//!
//! The package holds exactly what PowerPoint needs to open a deck: one slide
//! master, one blank layout, one theme and the document properties. Slides are
//! added later through [`crate::Presentation::append_slide`].

use crate::constants::*;
use crate::content_types::ContentTypes;
use crate::parse_rels::render_relationships;
use crate::types::Relationship;
use std::collections::BTreeMap;

pub const PRESENTATION_XML: &str = include_str!("../resources/presentation.xml");
pub const SLIDE_MASTER_XML: &str = include_str!("../resources/slideMaster1.xml");
pub const SLIDE_LAYOUT_XML: &str = include_str!("../resources/slideLayout1.xml");
pub const THEME_XML: &str = include_str!("../resources/theme1.xml");
pub const CORE_PROPERTIES_XML: &str = include_str!("../resources/core.xml");
pub const APP_PROPERTIES_XML: &str = include_str!("../resources/app.xml");

/// Empty slide that new [`crate::Slide`]s are rendered into.
pub const BLANK_SLIDE_XML: &str = include_str!("../resources/slide.xml");

const SLIDE_MASTER_PART: &str = "ppt/slideMasters/slideMaster1.xml";
const SLIDE_LAYOUT_PART: &str = "ppt/slideLayouts/slideLayout1.xml";
const THEME_PART: &str = "ppt/theme/theme1.xml";
const CORE_PROPERTIES_PART: &str = "docProps/core.xml";
const APP_PROPERTIES_PART: &str = "docProps/app.xml";

/// Builds every part of an empty presentation, keyed by zip entry name.
pub fn new_package() -> BTreeMap<String, Vec<u8>> {
    let mut parts = BTreeMap::new();
    let mut put = |name: &str, content: &str| {
        parts.insert(name.to_string(), content.as_bytes().to_vec());
    };

    put(CONTENT_TYPES_PART, &new_content_types().render());
    put(
        PACKAGE_RELS_PART,
        &render_relationships(&[
            Relationship::internal("rId1", OFFICE_DOCUMENT_REL_TYPE, DEFAULT_PRESENTATION_PART),
            Relationship::internal("rId2", CORE_PROPERTIES_REL_TYPE, CORE_PROPERTIES_PART),
            Relationship::internal("rId3", EXTENDED_PROPERTIES_REL_TYPE, APP_PROPERTIES_PART),
        ]),
    );
    put(CORE_PROPERTIES_PART, CORE_PROPERTIES_XML);
    put(APP_PROPERTIES_PART, APP_PROPERTIES_XML);

    put(DEFAULT_PRESENTATION_PART, PRESENTATION_XML);
    put(
        "ppt/_rels/presentation.xml.rels",
        &render_relationships(&[
            Relationship::internal("rId1", SLIDE_MASTER_REL_TYPE, "slideMasters/slideMaster1.xml"),
            Relationship::internal("rId2", THEME_REL_TYPE, "theme/theme1.xml"),
        ]),
    );

    put(SLIDE_MASTER_PART, SLIDE_MASTER_XML);
    put(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &render_relationships(&[
            Relationship::internal("rId1", SLIDE_LAYOUT_REL_TYPE, "../slideLayouts/slideLayout1.xml"),
            Relationship::internal("rId2", THEME_REL_TYPE, "../theme/theme1.xml"),
        ]),
    );
    put(SLIDE_LAYOUT_PART, SLIDE_LAYOUT_XML);
    put(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &render_relationships(&[Relationship::internal(
            "rId1",
            SLIDE_MASTER_REL_TYPE,
            "../slideMasters/slideMaster1.xml",
        )]),
    );
    put(THEME_PART, THEME_XML);

    parts
}

fn new_content_types() -> ContentTypes {
    let mut content_types = ContentTypes {
        defaults: vec![
            ("rels".to_string(), RELATIONSHIPS_CONTENT_TYPE.to_string()),
            ("xml".to_string(), "application/xml".to_string()),
        ],
        overrides: Vec::new(),
    };
    content_types.set_override(DEFAULT_PRESENTATION_PART, PRESENTATION_CONTENT_TYPE);
    content_types.set_override(SLIDE_MASTER_PART, SLIDE_MASTER_CONTENT_TYPE);
    content_types.set_override(SLIDE_LAYOUT_PART, SLIDE_LAYOUT_CONTENT_TYPE);
    content_types.set_override(THEME_PART, THEME_CONTENT_TYPE);
    content_types.set_override(CORE_PROPERTIES_PART, CORE_PROPERTIES_CONTENT_TYPE);
    content_types.set_override(APP_PROPERTIES_PART, EXTENDED_PROPERTIES_CONTENT_TYPE);
    content_types
}
