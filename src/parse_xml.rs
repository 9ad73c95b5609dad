use crate::constants::{
    A_NAMESPACE, DEFAULT_SLIDE_HEIGHT_EMU, DEFAULT_SLIDE_WIDTH_EMU, P_NAMESPACE, RELS_NAMESPACE,
};
use crate::types::{Color, TextShape};
use crate::{Error, Result};
use roxmltree::{Document, Node};

/// Everything a [`crate::Slide`] models from a slide part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideContent {
    pub background: Option<Color>,
    pub shapes: Vec<TextShape>,
}

/// `sldIdLst` entries and `sldSz` of a presentation part.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationInfo {
    /// `(id, r:id)` pairs in presentation order.
    pub slide_ids: Vec<(u32, String)>,
    pub slide_width: i64,
    pub slide_height: i64,
}

/// Decodes part bytes as UTF-8, dropping a leading byte order mark.
pub(crate) fn xml_str(xml_data: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(xml_data)?.trim_start_matches('\u{feff}'))
}

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, namespace: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| {
        n.is_element() && n.tag_name().name() == name && n.tag_name().namespace() == Some(namespace)
    })
}

pub(crate) fn emu_to_percent(emu: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    emu as f64 * 100.0 / total as f64
}

pub(crate) fn percent_to_emu(percent: f64, total: i64) -> i64 {
    (total as f64 * percent / 100.0).round() as i64
}

/// Parses the presentation part (`ppt/presentation.xml`).
///
/// A missing `<p:sldIdLst>` means the deck has no slides. A missing
/// `<p:sldSz>` falls back to the 4:3 default of 10" x 7.5".
pub fn parse_presentation_xml(xml_data: &[u8]) -> Result<PresentationInfo> {
    let doc = Document::parse(xml_str(xml_data)?)?;
    let root = doc.root_element();

    let mut slide_ids = Vec::new();
    if let Some(list) = child(root, P_NAMESPACE, "sldIdLst") {
        for sld_id in list.children().filter(|n| n.is_element() && n.tag_name().name() == "sldId") {
            let id = sld_id
                .attribute("id")
                .and_then(|v| v.parse::<u32>().ok())
                .ok_or_else(|| Error::Parse("<p:sldId> without numeric id".to_string()))?;
            let rel_id = sld_id
                .attribute((RELS_NAMESPACE, "id"))
                .ok_or_else(|| Error::Parse(format!("<p:sldId id=\"{}\"> without r:id", id)))?;
            slide_ids.push((id, rel_id.to_string()));
        }
    }

    let size = child(root, P_NAMESPACE, "sldSz");
    let dimension = |name: &str, default: i64| {
        size.and_then(|n| n.attribute(name))
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default)
    };

    Ok(PresentationInfo {
        slide_ids,
        slide_width: dimension("cx", DEFAULT_SLIDE_WIDTH_EMU),
        slide_height: dimension("cy", DEFAULT_SLIDE_HEIGHT_EMU),
    })
}

/// Parses raw XML slide data and extracts the background color and text shapes.
///
/// Only direct `<p:sp>` children of `<p:spTree>` that carry a `<p:txBody>` are
/// reported. Pictures, tables and group shapes stay untouched in the slide XML
/// but are not modelled.
///
/// # Arguments
///
/// - `xml_data`: Byte slice containing raw XML data of a PowerPoint slide.
/// - `slide_size`: Slide width and height in EMU, used to express geometry in percent.
///
/// # Errors
///
/// Parsing may fail and return [`Error`] if:
/// - The provided XML data isn't valid UTF-8.
/// - The XML structure is malformed or missing `<p:cSld>` or `<p:spTree>`.
pub fn parse_slide_xml(xml_data: &[u8], slide_size: (i64, i64)) -> Result<SlideContent> {
    let doc = Document::parse(xml_str(xml_data)?)?;
    let root = doc.root_element();

    let c_sld = child(root, P_NAMESPACE, "cSld").ok_or_else(|| Error::Parse("No <p:cSld> tag was found".to_string()))?;
    let sp_tree =
        child(c_sld, P_NAMESPACE, "spTree").ok_or_else(|| Error::Parse("No <p:spTree> tag was found".to_string()))?;

    let background = child(c_sld, P_NAMESPACE, "bg").and_then(parse_background);

    let shapes = sp_tree
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "sp" && n.tag_name().namespace() == Some(P_NAMESPACE))
        .filter_map(|sp| parse_text_shape(sp, slide_size))
        .collect();

    Ok(SlideContent { background, shapes })
}

/// Reads an explicit RGB background from `<p:bgPr>` or `<p:bgRef>`.
/// Scheme colors and picture fills resolve elsewhere and yield `None`.
fn parse_background(bg: Node) -> Option<Color> {
    let srgb = if let Some(bg_pr) = child(bg, P_NAMESPACE, "bgPr") {
        child(bg_pr, A_NAMESPACE, "solidFill").and_then(|fill| child(fill, A_NAMESPACE, "srgbClr"))
    } else {
        child(bg, P_NAMESPACE, "bgRef").and_then(|bg_ref| child(bg_ref, A_NAMESPACE, "srgbClr"))
    };

    srgb.and_then(|n| n.attribute("val")).and_then(|val| Color::from_hex(val).ok())
}

fn parse_text_shape(sp: Node, (width, height): (i64, i64)) -> Option<TextShape> {
    let tx_body = child(sp, P_NAMESPACE, "txBody")?;

    let paragraphs: Vec<String> = tx_body
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "p" && n.tag_name().namespace() == Some(A_NAMESPACE))
        .map(parse_paragraph)
        .collect();

    let mut shape = TextShape::new(paragraphs.join("\n"));

    let xfrm = child(sp, P_NAMESPACE, "spPr").and_then(|sp_pr| child(sp_pr, A_NAMESPACE, "xfrm"));
    if let Some(xfrm) = xfrm {
        let read = |name: &str, attr: &str| {
            child(xfrm, A_NAMESPACE, name)
                .and_then(|n| n.attribute(attr))
                .and_then(|v| v.parse::<i64>().ok())
        };
        if let (Some(x), Some(y)) = (read("off", "x"), read("off", "y")) {
            shape.x = emu_to_percent(x, width);
            shape.y = emu_to_percent(y, height);
        }
        if let (Some(cx), Some(cy)) = (read("ext", "cx"), read("ext", "cy")) {
            shape.width = emu_to_percent(cx, width);
            shape.height = emu_to_percent(cy, height);
        }
    }

    Some(shape)
}

/// Concatenates the text of runs, fields and line breaks of one `<a:p>`.
fn parse_paragraph(p_node: Node) -> String {
    let mut text = String::new();
    for node in p_node.children().filter(|n| n.is_element() && n.tag_name().namespace() == Some(A_NAMESPACE)) {
        match node.tag_name().name() {
            "r" | "fld" => {
                if let Some(t) = child(node, A_NAMESPACE, "t").and_then(|t| t.text()) {
                    text.push_str(t);
                }
            }
            "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}
