use crate::constants::PACKAGE_RELS_NAMESPACE;
use crate::parse_xml::xml_str;
use crate::types::Relationship;
use crate::{Error, Result};
use quick_xml::escape::escape;
use roxmltree::Document;

/// Parses a relationships (`.rels`) part into its `<Relationship>` entries.
///
/// Entries keep their document order. An entry missing `Id`, `Type` or `Target`
/// is rejected, since nothing could reference or resolve it.
///
/// # Errors
///
/// An error is returned if:
/// - The XML data is not valid UTF-8.
/// - Malformed or invalid XML structure is detected.
/// - A `<Relationship>` element lacks one of its required attributes.
pub fn parse_relationships(xml_data: &[u8]) -> Result<Vec<Relationship>> {
    let doc = Document::parse(xml_str(xml_data)?)?;
    let root = doc.root_element();

    let mut relationships = Vec::new();
    for rel in root.children().filter(|n| n.is_element() && n.tag_name().name() == "Relationship") {
        let attr = |name: &'static str| {
            rel.attribute(name)
                .map(str::to_string)
                .ok_or_else(|| Error::Parse(format!("<Relationship> without {} attribute", name)))
        };

        relationships.push(Relationship {
            id: attr("Id")?,
            rel_type: attr("Type")?,
            target: attr("Target")?,
            target_mode: rel.attribute("TargetMode").map(str::to_string),
        });
    }

    Ok(relationships)
}

/// Serializes relationships back into a `.rels` part.
pub fn render_relationships(relationships: &[Relationship]) -> String {
    let mut xml = String::with_capacity(128 + relationships.len() * 160);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(format!(r#"<Relationships xmlns="{}">"#, PACKAGE_RELS_NAMESPACE).as_str());

    for rel in relationships {
        xml.push_str(
            format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(rel.id.as_str()),
                escape(rel.rel_type.as_str()),
                escape(rel.target.as_str())
            )
            .as_str(),
        );
        if let Some(mode) = &rel.target_mode {
            xml.push_str(format!(r#" TargetMode="{}""#, escape(mode.as_str())).as_str());
        }
        xml.push_str("/>");
    }

    xml.push_str("</Relationships>");
    xml
}

/// Returns the first `rIdN` larger than every numeric `rId` already in use,
/// or the lowest free one when that number would overflow.
pub fn next_relationship_id(relationships: &[Relationship]) -> String {
    let used: Vec<u64> = relationships
        .iter()
        .filter_map(|rel| rel.id.strip_prefix("rId"))
        .filter_map(|num| num.parse::<u64>().ok())
        .collect();
    let next = used
        .iter()
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
        .or_else(|| (1..).find(|n| !used.contains(n)))
        .unwrap_or(1);
    format!("rId{}", next)
}

/// Constructs the path to the relationships part for a given part, e.g.
/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Resolves a relationship target against the part that owns the relationship.
///
/// `source_part` is `""` for package-level relationships. Absolute targets
/// (leading `/`) are resolved from the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let (mut segments, target): (Vec<&str>, &str) = match target.strip_prefix('/') {
        Some(absolute) => (Vec::new(), absolute),
        None => (
            source_part
                .rsplit_once('/')
                .map(|(dir, _)| dir.split('/').collect())
                .unwrap_or_default(),
            target,
        ),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Inverse of [`resolve_target`]: the relative target under which
/// `source_part` refers to `target_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = source_part
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    let target: Vec<&str> = target_part.split('/').collect();

    let common = source_dir
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count()
        .min(target.len().saturating_sub(1));

    let mut segments = vec![".."; source_dir.len() - common];
    segments.extend(target[common..].iter().copied());
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn load_xml(filename: &str) -> Vec<u8> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests");
        path.push("test_data");
        path.push("xml");
        path.push(filename);
        fs::read(path).expect("Unable to read test data file")
    }

    #[test]
    fn test_parse_presentation_rels() {
        let rels = parse_relationships(&load_xml("presentation_rels.xml")).unwrap();
        assert_eq!(rels.len(), 5);
        assert_eq!(rels[0].id, "rId1");
        assert!(rels[0].rel_type.ends_with("/slideMaster"));
        assert_eq!(rels[1].target, "slides/slide1.xml");
        assert_eq!(rels[4].target, "https://example.com/");
        assert!(rels[4].is_external());
        assert!(!rels[1].is_external());
    }

    #[test]
    fn test_parse_rejects_incomplete_relationship() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Target="x.xml"/></Relationships>"#;
        assert!(matches!(parse_relationships(xml), Err(Error::Parse(_))));
    }

    #[test]
    fn test_render_keeps_entries_and_target_mode() {
        let rels = parse_relationships(&load_xml("presentation_rels.xml")).unwrap();
        let rendered = render_relationships(&rels);
        assert_eq!(parse_relationships(rendered.as_bytes()).unwrap(), rels);
        assert!(rendered.contains(r#"TargetMode="External""#));
    }

    #[test]
    fn test_next_relationship_id() {
        let rels = parse_relationships(&load_xml("presentation_rels.xml")).unwrap();
        assert_eq!(next_relationship_id(&rels), "rId8");
        assert_eq!(next_relationship_id(&[]), "rId1");

        let at_limit = [
            Relationship::internal("rId1", "t", "a.xml"),
            Relationship::internal(format!("rId{}", u64::MAX), "t", "b.xml"),
        ];
        assert_eq!(next_relationship_id(&at_limit), "rId2");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
        assert_eq!(rels_path_for(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide2.xml"), "ppt/slides/slide2.xml");
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout1.xml"),
            "ppt/slideLayouts/slideLayout1.xml"
        );
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "/ppt/media/image1.png"), "ppt/media/image1.png");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target("ppt/presentation.xml", "ppt/slides/slide3.xml"), "slides/slide3.xml");
        assert_eq!(
            relative_target("ppt/slides/slide3.xml", "ppt/slideLayouts/slideLayout1.xml"),
            "../slideLayouts/slideLayout1.xml"
        );
        assert_eq!(relative_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
    }
}
