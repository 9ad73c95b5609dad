use crate::constants::*;
use crate::content_types::{natural_cmp, ContentTypes};
use crate::parse_rels::{
    next_relationship_id, parse_relationships, relative_target, rels_path_for, render_relationships, resolve_target,
};
use crate::parse_xml::{parse_presentation_xml, xml_str};
use crate::types::Relationship;
use crate::write_xml::patch_presentation_xml;
use crate::{template, Error, Result, Slide};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Main part content types that identify a PowerPoint deck.
const PRESENTATION_MAIN_CONTENT_TYPES: [&str; 4] = [
    PRESENTATION_CONTENT_TYPE,
    "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml",
    "application/vnd.openxmlformats-officedocument.presentationml.slideshow.main+xml",
    "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml",
];

/// An editable PowerPoint (pptx) presentation bound to a file path.
///
/// `Presentation` keeps every part of the package in memory. Slides are
/// modelled as [`Slide`]s; all other parts are written back unchanged on
/// [`Presentation::save`].
///
/// # Example
///
/// ```no_run
/// use pptx_slides::{Color, Presentation, Slide, TextShape};
///
/// let mut presentation = Presentation::create("deck.pptx")?;
/// let mut slide = Slide::new();
/// slide.set_background_color(Color::SILVER);
/// slide.add_text_shape(TextShape::new("Hello"));
/// presentation.append_slide(slide)?;
/// presentation.save()?;
/// # Ok::<(), pptx_slides::Error>(())
/// ```
#[derive(Debug)]
pub struct Presentation {
    path: PathBuf,
    parts: BTreeMap<String, Vec<u8>>,
    presentation_part: String,
    content_types: ContentTypes,
    relationships: Vec<Relationship>,
    slides: Vec<Slide>,
    slide_width: i64,
    slide_height: i64,
    last_slide_id: u32,
}

impl Presentation {
    /// Creates a new presentation without slides and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, for instance when the
    /// parent directory does not exist.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut presentation = Self::from_parts(path.as_ref().to_path_buf(), template::new_package())?;
        presentation.save()?;
        info!(path = %presentation.path.display(), "presentation created");
        Ok(presentation)
    }

    /// Opens a PowerPoint pptx file and loads all of its parts.
    ///
    /// Slides are resolved in presentation order through `<p:sldIdLst>` and the
    /// presentation relationships. Slide XML is parsed in parallel.
    ///
    /// # Errors
    ///
    /// Errors are returned on file access problems, failures during unzipping,
    /// malformed XML, or a package whose main part is not a presentation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.insert(name, content);
        }

        let presentation = Self::from_parts(path.to_path_buf(), parts)?;
        info!(
            path = %path.display(),
            slides = presentation.slides.len(),
            "presentation opened"
        );
        Ok(presentation)
    }

    fn from_parts(path: PathBuf, parts: BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let content_types = ContentTypes::parse(part(&parts, CONTENT_TYPES_PART)?)?;

        let main_target = match parts.get(PACKAGE_RELS_PART) {
            Some(data) => parse_relationships(data)?
                .into_iter()
                .find(|rel| rel.rel_type == OFFICE_DOCUMENT_REL_TYPE)
                .map(|rel| resolve_target("", &rel.target)),
            None => None,
        };
        let presentation_part = main_target.unwrap_or_else(|| {
            warn!("no officeDocument relationship, assuming {}", DEFAULT_PRESENTATION_PART);
            DEFAULT_PRESENTATION_PART.to_string()
        });

        match content_types.content_type_of(&presentation_part) {
            Some(ct) if PRESENTATION_MAIN_CONTENT_TYPES.contains(&ct) => {}
            other => {
                return Err(Error::Parse(format!(
                    "{} is not a presentation part (content type {:?})",
                    presentation_part, other
                )))
            }
        }

        let info = parse_presentation_xml(part(&parts, &presentation_part)?)?;
        let relationships = match parts.get(&rels_path_for(&presentation_part)) {
            Some(data) => parse_relationships(data)?,
            None => Vec::new(),
        };
        let slide_size = (info.slide_width, info.slide_height);

        // Resolve every slide part sequentially, then parse the XML in parallel
        let mut raw_data = Vec::with_capacity(info.slide_ids.len());
        for (slide_id, rel_id) in &info.slide_ids {
            let rel = relationships
                .iter()
                .find(|rel| &rel.id == rel_id)
                .ok_or_else(|| Error::MissingPart(format!("relationship {} of {}", rel_id, presentation_part)))?;
            let part_name = resolve_target(&presentation_part, &rel.target);
            let xml = part(&parts, &part_name)?;
            let slide_rels = match parts.get(&rels_path_for(&part_name)) {
                Some(data) => parse_relationships(data)?,
                None => Vec::new(),
            };
            raw_data.push((*slide_id, rel_id.clone(), part_name, xml, slide_rels));
        }

        let slides: Result<Vec<Slide>> = raw_data
            .into_par_iter()
            .map(|(slide_id, rel_id, part_name, xml, slide_rels)| {
                let mut slide = Slide::parse(xml, part_name, slide_rels, slide_size)?;
                slide.slide_id = Some(slide_id);
                slide.rel_id = Some(rel_id);
                Ok(slide)
            })
            .collect();
        let slides = slides?;

        let last_slide_id = info
            .slide_ids
            .iter()
            .map(|(id, _)| *id)
            .max()
            .unwrap_or(FIRST_SLIDE_ID - 1)
            .max(FIRST_SLIDE_ID - 1);

        Ok(Self {
            path,
            parts,
            presentation_part,
            content_types,
            relationships,
            slides,
            slide_width: info.slide_width,
            slide_height: info.slide_height,
            last_slide_id,
        })
    }

    /// File the presentation is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// All slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub fn slide(&self, index: usize) -> Result<&Slide> {
        self.slides.get(index).ok_or(Error::SlideNotFound(index))
    }

    pub fn slide_mut(&mut self, index: usize) -> Result<&mut Slide> {
        self.slides.get_mut(index).ok_or(Error::SlideNotFound(index))
    }

    /// Appends a slide at the end of the presentation.
    ///
    /// The slide gets the next free `slideN.xml` part, slide id and
    /// relationship id, and is linked to the first slide layout of the deck.
    /// A slide previously removed from a deck keeps its own relationships.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPart`] when one of the slide's internal
    /// relationships points to a part this deck does not have, such as media
    /// of a slide removed from another deck. Nothing is changed in that case.
    pub fn append_slide(&mut self, mut slide: Slide) -> Result<&mut Slide> {
        let layout = self.default_layout()?;
        let part_name = self.next_slide_part_name();
        let rel_id = next_relationship_id(&self.relationships);
        let slide_id = self.next_slide_id()?;

        let mut slide_rels: Vec<Relationship> = slide
            .relationships
            .iter()
            .filter(|rel| rel.rel_type != NOTES_SLIDE_REL_TYPE)
            .cloned()
            .collect();
        let layout_target = relative_target(&part_name, &layout);
        match slide_rels.iter_mut().find(|rel| rel.rel_type == SLIDE_LAYOUT_REL_TYPE) {
            Some(rel) if self.parts.contains_key(&resolve_target(&part_name, &rel.target)) => {}
            Some(rel) => rel.target = layout_target,
            None => {
                let id = next_relationship_id(&slide_rels);
                slide_rels.push(Relationship::internal(id, SLIDE_LAYOUT_REL_TYPE, layout_target));
            }
        }

        let dangling = slide_rels
            .iter()
            .filter(|rel| !rel.is_external() && rel.rel_type != SLIDE_LAYOUT_REL_TYPE)
            .map(|rel| resolve_target(&part_name, &rel.target))
            .find(|target| !self.parts.contains_key(target));
        if let Some(target) = dangling {
            return Err(Error::MissingPart(target));
        }

        self.parts
            .insert(rels_path_for(&part_name), render_relationships(&slide_rels).into_bytes());
        self.content_types.set_override(&part_name, SLIDE_CONTENT_TYPE);
        self.relationships.push(Relationship::internal(
            rel_id.clone(),
            SLIDE_REL_TYPE,
            relative_target(&self.presentation_part, &part_name),
        ));

        debug!(part = %part_name, slide_id, rel_id = %rel_id, "slide appended");

        slide.rebind(self.slide_size());
        slide.relationships = slide_rels;
        slide.part_name = Some(part_name);
        slide.slide_id = Some(slide_id);
        slide.rel_id = Some(rel_id);
        self.last_slide_id = self.last_slide_id.max(slide_id);

        let index = self.slides.len();
        self.slides.push(slide);
        self.slide_mut(index)
    }

    /// Removes the slide at `index` and returns it.
    ///
    /// The slide part, its relationships part, its content type override, its
    /// entry in the presentation relationships and any notes slide it owns are
    /// dropped from the package.
    pub fn remove_slide(&mut self, index: usize) -> Result<Slide> {
        if index >= self.slides.len() {
            return Err(Error::SlideNotFound(index));
        }

        let mut slide = self.slides.remove(index);
        if let Some(rel_id) = &slide.rel_id {
            self.relationships.retain(|rel| &rel.id != rel_id);
        }
        if let Some(part_name) = slide.part_name.clone() {
            let notes: Vec<String> = slide
                .relationships
                .iter()
                .filter(|rel| rel.rel_type == NOTES_SLIDE_REL_TYPE && !rel.is_external())
                .map(|rel| resolve_target(&part_name, &rel.target))
                .collect();
            for notes_part in notes {
                self.remove_part(&notes_part);
            }
            self.remove_part(&part_name);
            info!(index, part = %part_name, "slide removed");
        }

        slide.unbind();
        Ok(slide)
    }

    /// Slide width in points.
    pub fn slide_width(&self) -> f64 {
        self.slide_width as f64 / EMU_PER_POINT as f64
    }

    /// Slide height in points.
    pub fn slide_height(&self) -> f64 {
        self.slide_height as f64 / EMU_PER_POINT as f64
    }

    /// Sets the slide width in points (72 to 4032).
    pub fn set_slide_width(&mut self, points: f64) -> Result<()> {
        self.slide_width = points_to_slide_emu(points)?;
        self.propagate_slide_size();
        Ok(())
    }

    /// Sets the slide height in points (72 to 4032).
    pub fn set_slide_height(&mut self, points: f64) -> Result<()> {
        self.slide_height = points_to_slide_emu(points)?;
        self.propagate_slide_size();
        Ok(())
    }

    /// Commits pending slide changes and writes the package to its path.
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone();
        self.write_to(&path)
    }

    /// Saves to a different path, which becomes the presentation's path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.path = path.as_ref().to_path_buf();
        self.save()
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        for slide in &mut self.slides {
            slide.update()?;
        }
        self.flush_parts()?;

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // [Content_Types].xml leads the archive
        let names = std::iter::once(CONTENT_TYPES_PART)
            .chain(self.parts.keys().map(String::as_str).filter(|name| *name != CONTENT_TYPES_PART));
        for name in names {
            zip.start_file(name, options)?;
            zip.write_all(part(&self.parts, name)?)?;
        }
        zip.finish()?.flush()?;

        info!(
            path = %path.display(),
            slides = self.slides.len(),
            parts = self.parts.len(),
            "presentation saved"
        );
        Ok(())
    }

    /// Writes the slide, presentation, relationship and content type model
    /// back into the in-memory parts.
    fn flush_parts(&mut self) -> Result<()> {
        for slide in &self.slides {
            if let (Some(part_name), Some(xml)) = (&slide.part_name, slide.xml()) {
                self.parts.insert(part_name.clone(), xml.as_bytes().to_vec());
            }
        }

        let slide_ids: Vec<(u32, String)> = self
            .slides
            .iter()
            .filter_map(|slide| Some((slide.slide_id?, slide.rel_id.clone()?)))
            .collect();
        let presentation_xml = patch_presentation_xml(
            xml_str(part(&self.parts, &self.presentation_part)?)?,
            &slide_ids,
            self.slide_size(),
        )?;
        self.parts
            .insert(self.presentation_part.clone(), presentation_xml.into_bytes());
        self.parts.insert(
            rels_path_for(&self.presentation_part),
            render_relationships(&self.relationships).into_bytes(),
        );
        self.parts
            .insert(CONTENT_TYPES_PART.to_string(), self.content_types.render().into_bytes());
        Ok(())
    }

    fn slide_size(&self) -> (i64, i64) {
        (self.slide_width, self.slide_height)
    }

    fn propagate_slide_size(&mut self) {
        let size = self.slide_size();
        for slide in &mut self.slides {
            slide.slide_size = size;
        }
    }

    /// One above the highest id seen so far. Past `ST_SlideId`'s upper bound
    /// the lowest id not used by a slide of the deck is taken instead.
    fn next_slide_id(&self) -> Result<u32> {
        if let Some(id) = self.last_slide_id.checked_add(1).filter(|id| *id <= MAX_SLIDE_ID) {
            return Ok(id.max(FIRST_SLIDE_ID));
        }

        let used: HashSet<u32> = self.slides.iter().filter_map(|slide| slide.slide_id).collect();
        (FIRST_SLIDE_ID..=MAX_SLIDE_ID)
            .find(|id| !used.contains(id))
            .ok_or(Error::SlideIdsExhausted)
    }

    fn default_layout(&self) -> Result<String> {
        self.content_types
            .parts_of_type(SLIDE_LAYOUT_CONTENT_TYPE)
            .into_iter()
            .find(|name| self.parts.contains_key(*name))
            .map(str::to_string)
            .ok_or_else(|| Error::MissingPart("slide layout".to_string()))
    }

    /// First `slideN.xml` above every slide part in the package or in the deck.
    fn next_slide_part_name(&self) -> String {
        let template = resolve_target(&self.presentation_part, "slides/slide1.xml");
        let prefix = template.trim_end_matches("1.xml");

        let max = self
            .parts
            .keys()
            .map(String::as_str)
            .chain(self.slides.iter().filter_map(|slide| slide.part_name.as_deref()))
            .filter_map(|name| name.strip_prefix(prefix)?.strip_suffix(".xml")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        format!("{}{}.xml", prefix, max + 1)
    }

    fn remove_part(&mut self, part_name: &str) {
        self.parts.remove(part_name);
        self.parts.remove(&rels_path_for(part_name));
        self.content_types.remove_override(part_name);
    }

    /// Names of all parts in the package, in natural order.
    pub fn part_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parts.keys().map(String::as_str).collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }
}

fn part<'a>(parts: &'a BTreeMap<String, Vec<u8>>, name: &str) -> Result<&'a [u8]> {
    parts
        .get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| Error::MissingPart(name.to_string()))
}

fn points_to_slide_emu(points: f64) -> Result<i64> {
    let emu = (points * EMU_PER_POINT as f64).round();
    if !emu.is_finite() || emu < MIN_SLIDE_EMU as f64 || emu > MAX_SLIDE_EMU as f64 {
        return Err(Error::InvalidDimension(points));
    }
    Ok(emu as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, TextShape};

    #[test]
    fn test_points_to_slide_emu() {
        assert_eq!(points_to_slide_emu(720.0).unwrap(), DEFAULT_SLIDE_WIDTH_EMU);
        assert_eq!(points_to_slide_emu(400.0).unwrap(), 5_080_000);
        assert!(matches!(points_to_slide_emu(71.0), Err(Error::InvalidDimension(_))));
        assert!(matches!(points_to_slide_emu(4033.0), Err(Error::InvalidDimension(_))));
        assert!(matches!(points_to_slide_emu(f64::NAN), Err(Error::InvalidDimension(_))));
    }

    #[test]
    fn test_template_package_loads_without_slides() {
        let presentation = Presentation::from_parts(PathBuf::from("unused.pptx"), template::new_package()).unwrap();
        assert_eq!(presentation.slide_count(), 0);
        assert_eq!(presentation.slide_width(), 720.0);
        assert_eq!(presentation.slide_height(), 540.0);
        assert_eq!(presentation.last_slide_id, FIRST_SLIDE_ID - 1);
    }

    #[test]
    fn test_append_binds_parts_in_memory() {
        let mut presentation = Presentation::from_parts(PathBuf::from("unused.pptx"), template::new_package()).unwrap();
        let mut slide = Slide::new();
        slide.add_text_shape(TextShape::new("one"));
        presentation.append_slide(slide).unwrap();
        presentation.append_slide(Slide::new()).unwrap();

        let first = presentation.slide(0).unwrap();
        assert_eq!(first.part_name(), Some("ppt/slides/slide1.xml"));
        assert_eq!(first.slide_id, Some(256));
        assert_eq!(first.rel_id.as_deref(), Some("rId3"));
        assert_eq!(presentation.slide(1).unwrap().part_name(), Some("ppt/slides/slide2.xml"));

        let rels = parse_relationships(&presentation.parts["ppt/slides/_rels/slide1.xml.rels"]).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target, "../slideLayouts/slideLayout1.xml");
        assert_eq!(
            presentation.content_types.content_type_of("ppt/slides/slide2.xml"),
            Some(SLIDE_CONTENT_TYPE)
        );
    }

    #[test]
    fn test_flush_writes_slide_list() {
        let mut presentation = Presentation::from_parts(PathBuf::from("unused.pptx"), template::new_package()).unwrap();
        let mut slide = Slide::new();
        slide.set_background_color(Color::SILVER);
        presentation.append_slide(slide).unwrap();
        presentation.append_slide(Slide::new()).unwrap();
        presentation.remove_slide(0).unwrap();
        for slide in presentation.slides_mut() {
            slide.update().unwrap();
        }
        presentation.flush_parts().unwrap();

        let info = parse_presentation_xml(&presentation.parts[DEFAULT_PRESENTATION_PART]).unwrap();
        assert_eq!(info.slide_ids, vec![(257, "rId4".to_string())]);
        assert!(!presentation.parts.contains_key("ppt/slides/_rels/slide1.xml.rels"));
        assert!(presentation.parts.contains_key("ppt/slides/slide2.xml"));
    }

    fn deck_with_top_slide_id(top_id: u32) -> Presentation {
        let mut presentation = Presentation::from_parts(PathBuf::from("unused.pptx"), template::new_package()).unwrap();
        presentation.append_slide(Slide::new()).unwrap();
        presentation.append_slide(Slide::new()).unwrap();
        presentation.slides[1].slide_id = Some(top_id);
        presentation.last_slide_id = top_id;
        presentation
    }

    #[test]
    fn test_slide_id_wraps_below_upper_bound() {
        let mut presentation = deck_with_top_slide_id(MAX_SLIDE_ID);
        presentation.append_slide(Slide::new()).unwrap();
        presentation.append_slide(Slide::new()).unwrap();

        let ids: Vec<u32> = presentation.slides().iter().filter_map(|s| s.slide_id).collect();
        assert_eq!(ids, vec![256, MAX_SLIDE_ID, 257, 258]);

        for slide in presentation.slides_mut() {
            slide.update().unwrap();
        }
        presentation.flush_parts().unwrap();
        let info = parse_presentation_xml(&presentation.parts[DEFAULT_PRESENTATION_PART]).unwrap();
        assert!(info.slide_ids.iter().all(|(id, _)| (FIRST_SLIDE_ID..=MAX_SLIDE_ID).contains(id)));
    }

    #[test]
    fn test_slide_id_at_integer_limit_does_not_overflow() {
        let mut presentation = deck_with_top_slide_id(u32::MAX);
        let slide = presentation.append_slide(Slide::new()).unwrap();
        assert_eq!(slide.slide_id, Some(257));
    }

    #[test]
    fn test_append_rejects_missing_relationship_target() {
        let mut presentation = Presentation::from_parts(PathBuf::from("unused.pptx"), template::new_package()).unwrap();
        let mut slide = Slide::new();
        slide.relationships.push(Relationship::internal(
            "rId2",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image",
            "../media/image1.png",
        ));
        let parts_before = presentation.parts.len();

        let result = presentation.append_slide(slide);
        assert!(matches!(result, Err(Error::MissingPart(ref part)) if part == "ppt/media/image1.png"));
        assert_eq!(presentation.slide_count(), 0);
        assert_eq!(presentation.parts.len(), parts_before);
        assert_eq!(presentation.relationships.len(), 2);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut presentation = Presentation::from_parts(PathBuf::from("unused.pptx"), template::new_package()).unwrap();
        assert!(matches!(presentation.remove_slide(0), Err(Error::SlideNotFound(0))));
        assert!(matches!(presentation.slide_mut(3), Err(Error::SlideNotFound(3))));
    }
}
