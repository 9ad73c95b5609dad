//! In-place edits of slide and presentation parts.
//!
//! Parts are never re-serialized from a model. Instead the byte ranges
//! roxmltree reports for the affected elements are replaced, so everything the
//! crate does not model (pictures, tables, extension lists, vendor markup)
//! survives untouched.

use crate::constants::{A_NAMESPACE, P_NAMESPACE, RELS_NAMESPACE};
use crate::parse_xml::{child, percent_to_emu};
use crate::types::{Color, TextShape};
use crate::{Error, Result};
use quick_xml::escape::escape;
use roxmltree::{Document, Node};
use std::ops::Range;

/// What should happen to `<p:bg>` when a slide is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundEdit {
    Keep,
    Set(Color),
    Clear,
}

/// `xmlns:` declarations for each wanted prefix that `node` does not already
/// bind to the expected namespace.
fn missing_declarations(node: Node, wanted: &[(&str, &str)]) -> String {
    wanted
        .iter()
        .filter(|(prefix, uri)| !node.namespaces().any(|ns| ns.name() == Some(*prefix) && ns.uri() == *uri))
        .map(|(prefix, uri)| format!(r#" xmlns:{}="{}""#, prefix, uri))
        .collect()
}

fn apply_edits(xml: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut out = xml.to_string();
    for (range, replacement) in edits {
        out.replace_range(range, &replacement);
    }
    out
}

/// Byte offset of the closing tag of a non-empty element.
fn closing_tag_start(xml: &str, node: Node) -> Result<usize> {
    let range = node.range();
    xml[range.clone()]
        .rfind("</")
        .map(|offset| range.start + offset)
        .ok_or_else(|| Error::Parse(format!("<{}> has no closing tag", node.tag_name().name())))
}

fn first_element_child_start(node: Node) -> Option<usize> {
    node.children().find(|n| n.is_element()).map(|n| n.range().start)
}

pub fn background_xml(color: Color, declarations: &str) -> String {
    format!(
        r#"<p:bg{}><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        declarations,
        color.to_hex()
    )
}

/// A `txBox` shape with one paragraph per line of text.
pub fn text_shape_xml(id: u32, shape: &TextShape, (width, height): (i64, i64), declarations: &str) -> String {
    let mut xml = String::with_capacity(512 + shape.text.len());
    xml.push_str(format!("<p:sp{}>", declarations).as_str());
    xml.push_str("<p:nvSpPr>");
    xml.push_str(format!(r#"<p:cNvPr id="{}" name="TextBox {}"/>"#, id, id.saturating_sub(1)).as_str());
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/>"#);
    xml.push_str("</p:nvSpPr>");

    xml.push_str("<p:spPr><a:xfrm>");
    xml.push_str(
        format!(
            r#"<a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/>"#,
            percent_to_emu(shape.x, width),
            percent_to_emu(shape.y, height),
            percent_to_emu(shape.width, width).max(0),
            percent_to_emu(shape.height, height).max(0)
        )
        .as_str(),
    );
    xml.push_str(r#"</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);

    xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#);
    for line in shape.text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        } else {
            xml.push_str(
                format!(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape(line)).as_str(),
            );
        }
    }
    xml.push_str("</p:txBody></p:sp>");
    xml
}

/// Applies a background edit and appends new text shapes to a slide part.
///
/// New shapes get `cNvPr` ids above every id already present in the part.
pub fn patch_slide_xml(
    xml: &str,
    background: BackgroundEdit,
    new_shapes: &[TextShape],
    slide_size: (i64, i64),
) -> Result<String> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let c_sld = child(root, P_NAMESPACE, "cSld").ok_or_else(|| Error::Parse("No <p:cSld> tag was found".to_string()))?;
    let sp_tree =
        child(c_sld, P_NAMESPACE, "spTree").ok_or_else(|| Error::Parse("No <p:spTree> tag was found".to_string()))?;
    let declarations = missing_declarations(sp_tree, &[("p", P_NAMESPACE), ("a", A_NAMESPACE)]);

    let mut edits = Vec::new();

    match (child(c_sld, P_NAMESPACE, "bg"), background) {
        (_, BackgroundEdit::Keep) => {}
        (Some(bg), BackgroundEdit::Set(color)) => edits.push((bg.range(), background_xml(color, &declarations))),
        (Some(bg), BackgroundEdit::Clear) => edits.push((bg.range(), String::new())),
        (None, BackgroundEdit::Set(color)) => {
            // <p:bg> must precede <p:spTree>
            let at = first_element_child_start(c_sld).unwrap_or(sp_tree.range().start);
            edits.push((at..at, background_xml(color, &declarations)));
        }
        (None, BackgroundEdit::Clear) => {}
    }

    if !new_shapes.is_empty() {
        let max_id = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "cNvPr")
            .filter_map(|n| n.attribute("id").and_then(|id| id.parse::<u32>().ok()))
            .max()
            .unwrap_or(1);

        let mut shapes_xml = String::new();
        for (offset, shape) in new_shapes.iter().enumerate() {
            let id = u32::try_from(offset)
                .ok()
                .and_then(|offset| max_id.checked_add(1)?.checked_add(offset))
                .ok_or_else(|| Error::Parse(format!("No shape id left above {}", max_id)))?;
            shapes_xml.push_str(&text_shape_xml(id, shape, slide_size, &declarations));
        }

        let at = closing_tag_start(xml, sp_tree)?;
        edits.push((at..at, shapes_xml));
    }

    Ok(apply_edits(xml, edits))
}

/// Rewrites `<p:sldIdLst>` and `<p:sldSz>` of a presentation part.
///
/// An empty slide list removes `<p:sldIdLst>`, which the schema forbids to be
/// empty. A changed size drops the `type` preset since it no longer applies.
pub fn patch_presentation_xml(xml: &str, slide_ids: &[(u32, String)], slide_size: (i64, i64)) -> Result<String> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let declarations = missing_declarations(root, &[("p", P_NAMESPACE), ("r", RELS_NAMESPACE)]);

    let mut list_xml = String::new();
    if !slide_ids.is_empty() {
        list_xml.push_str(format!("<p:sldIdLst{}>", declarations).as_str());
        for (id, rel_id) in slide_ids {
            list_xml.push_str(format!(r#"<p:sldId id="{}" r:id="{}"/>"#, id, escape(rel_id.as_str())).as_str());
        }
        list_xml.push_str("</p:sldIdLst>");
    }

    let size_xml = format!(r#"<p:sldSz{} cx="{}" cy="{}"/>"#, declarations, slide_size.0, slide_size.1);

    // sldIdLst follows the master id lists
    let anchor = ["handoutMasterIdLst", "notesMasterIdLst", "sldMasterIdLst"]
        .iter()
        .find_map(|name| child(root, P_NAMESPACE, name))
        .map(|n| n.range().end)
        .or_else(|| first_element_child_start(root))
        .ok_or_else(|| Error::Parse("<p:presentation> has no children".to_string()))?;

    let mut edits = Vec::new();
    let mut pending = String::new();

    let list = child(root, P_NAMESPACE, "sldIdLst");
    match list {
        Some(list) => edits.push((list.range(), list_xml)),
        None => pending.push_str(&list_xml),
    }

    match child(root, P_NAMESPACE, "sldSz") {
        Some(size) => {
            let current = (
                size.attribute("cx").and_then(|v| v.parse::<i64>().ok()),
                size.attribute("cy").and_then(|v| v.parse::<i64>().ok()),
            );
            if current != (Some(slide_size.0), Some(slide_size.1)) {
                edits.push((size.range(), size_xml));
            }
        }
        // sldSz follows sldIdLst
        None => match list {
            Some(list) => edits.push((list.range().end..list.range().end, size_xml)),
            None => pending.push_str(&size_xml),
        },
    }

    if !pending.is_empty() {
        edits.push((anchor..anchor, pending));
    }

    Ok(apply_edits(xml, edits))
}
