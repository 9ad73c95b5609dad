use crate::constants::CONTENT_TYPES_NAMESPACE;
use crate::parse_xml::xml_str;
use crate::Result;
use quick_xml::escape::escape;
use roxmltree::Document;

/// In-memory form of `[Content_Types].xml`.
///
/// Part names are stored without their leading `/` so they compare directly
/// against zip entry names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    pub defaults: Vec<(String, String)>,
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn parse(xml_data: &[u8]) -> Result<Self> {
        let doc = Document::parse(xml_str(xml_data)?)?;
        let mut content_types = ContentTypes::default();

        for node in doc.root_element().children().filter(|n| n.is_element()) {
            let content_type = match node.attribute("ContentType") {
                Some(ct) => ct.to_string(),
                None => continue,
            };
            match node.tag_name().name() {
                "Default" => {
                    if let Some(ext) = node.attribute("Extension") {
                        content_types.defaults.push((ext.to_ascii_lowercase(), content_type));
                    }
                }
                "Override" => {
                    if let Some(part) = node.attribute("PartName") {
                        content_types
                            .overrides
                            .push((part.trim_start_matches('/').to_string(), content_type));
                    }
                }
                _ => {}
            }
        }

        Ok(content_types)
    }

    /// Content type of a part, from its override or else its extension default.
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        if let Some((_, ct)) = self.overrides.iter().find(|(part, _)| part.eq_ignore_ascii_case(part_name)) {
            return Some(ct.as_str());
        }
        let ext = part_name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.iter().find(|(e, _)| *e == ext).map(|(_, ct)| ct.as_str())
    }

    /// Part names carrying the given override content type, sorted.
    pub fn parts_of_type(&self, content_type: &str) -> Vec<&str> {
        let mut parts: Vec<&str> = self
            .overrides
            .iter()
            .filter(|(_, ct)| ct == content_type)
            .map(|(part, _)| part.as_str())
            .collect();
        parts.sort_by(|a, b| natural_cmp(a, b));
        parts
    }

    pub fn set_override(&mut self, part_name: &str, content_type: &str) {
        self.remove_override(part_name);
        self.overrides.push((part_name.to_string(), content_type.to_string()));
    }

    pub fn remove_override(&mut self, part_name: &str) {
        self.overrides.retain(|(part, _)| !part.eq_ignore_ascii_case(part_name));
    }

    pub fn render(&self) -> String {
        let mut xml = String::with_capacity(256 + (self.defaults.len() + self.overrides.len()) * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(format!(r#"<Types xmlns="{}">"#, CONTENT_TYPES_NAMESPACE).as_str());
        for (ext, ct) in &self.defaults {
            xml.push_str(
                format!(r#"<Default Extension="{}" ContentType="{}"/>"#, escape(ext.as_str()), escape(ct.as_str()))
                    .as_str(),
            );
        }
        for (part, ct) in &self.overrides {
            xml.push_str(
                format!(r#"<Override PartName="/{}" ContentType="{}"/>"#, escape(part.as_str()), escape(ct.as_str()))
                    .as_str(),
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

/// Orders `slide2.xml` before `slide10.xml`.
pub fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    fn split(name: &str) -> (&str, Option<u32>) {
        let stem = name.strip_suffix(".xml").unwrap_or(name);
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (prefix, number) = stem.split_at(stem.len() - digits);
        (prefix, number.parse().ok())
    }
    split(a).cmp(&split(b)).then_with(|| a.cmp(b))
}
