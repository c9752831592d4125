//! PPTX template inspection.
//!
//! Reads `ppt/slideLayouts/slideLayoutN.xml` parts in numeric order and turns
//! every placeholder shape into a [`PlaceholderDescriptor`]. Layout ids are
//! zero-based positions in that order, matching how a document library
//! indexes a template's layouts.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slideplan_core::{
    ColumnAffinity, Error, LayoutDescriptor, LayoutId, PlaceholderDescriptor, PurposeType, Result,
    StructureTag,
};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// 16:9 slide width in EMU, used when `presentation.xml` has no `sldSz`.
const DEFAULT_SLIDE_WIDTH: f64 = 12_192_000.0;

/// Prefix of slide layout parts inside the package.
const LAYOUT_PREFIX: &str = "ppt/slideLayouts/slideLayout";

/// Reads layout descriptors out of a .pptx template.
pub struct TemplateInspector;

impl TemplateInspector {
    /// Create a new template inspector.
    pub fn new() -> Self {
        Self
    }

    /// Inspect a template file on disk.
    pub fn inspect_path(&self, path: &Path) -> Result<Vec<LayoutDescriptor>> {
        let file = File::open(path)?;
        self.inspect(BufReader::new(file))
    }

    /// Inspect a template from a reader.
    pub fn inspect<R: Read + Seek>(&self, reader: R) -> Result<Vec<LayoutDescriptor>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_width = self.slide_width(&mut archive);
        let layout_paths = self.layout_order(&archive);

        if layout_paths.is_empty() {
            return Err(Error::Configuration(
                "template contains no slide layouts".to_string(),
            ));
        }

        let mut layouts = Vec::with_capacity(layout_paths.len());
        for (id, path) in layout_paths.iter().enumerate() {
            let xml = self.read_file_from_archive(&mut archive, path)?;
            let layout = self.parse_layout(&xml, id, slide_width)?;
            log::debug!(
                "Layout {} '{}' ({}): {} placeholders",
                id,
                layout.semantic_name,
                layout.structure.as_str(),
                layout.placeholders.len()
            );
            layouts.push(layout);
        }

        Ok(layouts)
    }

    /// Slide width from `ppt/presentation.xml`, or the 16:9 default.
    fn slide_width<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> f64 {
        let Ok(xml) = self.read_file_from_archive(archive, "ppt/presentation.xml") else {
            log::warn!("No presentation.xml in template, assuming 16:9 slides");
            return DEFAULT_SLIDE_WIDTH;
        };

        let mut reader = Reader::from_str(&xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"sldSz" =>
                {
                    if let Some(cx) = attr_value(e, b"cx").and_then(|v| v.parse::<f64>().ok()) {
                        return cx;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!("XML parsing error in presentation.xml: {}", e);
                    break;
                }
                _ => {}
            }
        }

        DEFAULT_SLIDE_WIDTH
    }

    /// Slide layout part paths, sorted by their layout number.
    fn layout_order<R: Read + Seek>(&self, archive: &ZipArchive<R>) -> Vec<String> {
        let mut paths: Vec<(String, Option<usize>)> = archive
            .file_names()
            .filter(|name| name.starts_with(LAYOUT_PREFIX) && name.ends_with(".xml"))
            .map(|name| (name.to_string(), extract_part_number(name)))
            .collect();

        paths.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        paths.into_iter().map(|(path, _)| path).collect()
    }

    /// Parse one slide layout part.
    fn parse_layout(&self, xml: &str, id: LayoutId, slide_width: f64) -> Result<LayoutDescriptor> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut layout_name = String::new();
        let mut layout_type: Option<String> = None;
        let mut current_shape: Option<ShapeInfo> = None;
        let mut placeholders = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sldLayout" => layout_type = attr_value(e, b"type"),
                        b"cSld" => layout_name = attr_value(e, b"name").unwrap_or_default(),
                        b"sp" | b"pic" | b"graphicFrame" => {
                            current_shape = Some(ShapeInfo::default())
                        }
                        other => {
                            if let Some(ref mut shape) = current_shape {
                                shape.read_element(other, e);
                            }
                        }
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    if let Some(ref mut shape) = current_shape {
                        shape.read_element(local_name(name.as_ref()), e);
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    if matches!(local_name(name.as_ref()), b"sp" | b"pic" | b"graphicFrame") {
                        if let Some(shape) = current_shape.take() {
                            if let Some(placeholder) = shape.into_placeholder(slide_width) {
                                placeholders.push(placeholder);
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing slide layout {}: {}",
                        id, e
                    )));
                }
                _ => {}
            }
        }

        let structure = structure_for(layout_type.as_deref(), &placeholders);
        if layout_name.is_empty() {
            layout_name = format!("Layout {}", id);
        }

        let mut layout = LayoutDescriptor::new(id, layout_name, structure);
        layout.placeholders = placeholders;
        Ok(layout)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for TemplateInspector {
    fn default() -> Self {
        Self::new()
    }
}

/// What we collect from one shape in a layout's shape tree.
#[derive(Debug, Default)]
struct ShapeInfo {
    name: String,
    description: String,
    /// `p:ph@type`; set once a `p:ph` element is seen.
    placeholder_type: Option<String>,
    x: Option<f64>,
    cx: Option<f64>,
}

impl ShapeInfo {
    fn read_element(&mut self, local: &[u8], e: &BytesStart) {
        match local {
            b"cNvPr" if self.name.is_empty() => {
                self.name = attr_value(e, b"name").unwrap_or_default();
                self.description = attr_value(e, b"descr").unwrap_or_default();
            }
            // A placeholder with no type attribute is a generic object slot
            b"ph" => {
                self.placeholder_type =
                    Some(attr_value(e, b"type").unwrap_or_else(|| "obj".to_string()));
            }
            b"off" if self.x.is_none() => {
                self.x = attr_value(e, b"x").and_then(|v| v.parse().ok());
            }
            b"ext" if self.cx.is_none() => {
                self.cx = attr_value(e, b"cx").and_then(|v| v.parse().ok());
            }
            _ => {}
        }
    }

    fn into_placeholder(self, slide_width: f64) -> Option<PlaceholderDescriptor> {
        let placeholder_type = self.placeholder_type?;
        let name_key = slideplan_core::types::match_key(&self.name);
        let purpose = purpose_for(&placeholder_type, &name_key)?;

        let column = match (self.x, self.cx) {
            (Some(x), Some(cx)) => column_for(x + cx / 2.0, slide_width),
            _ => ColumnAffinity::None,
        };

        let semantic_name = if self.description.trim().is_empty() {
            self.name.clone()
        } else {
            self.description
        };

        Some(
            PlaceholderDescriptor::new(self.name, purpose)
                .with_semantic_name(semantic_name)
                .with_column(column)
                .with_required(purpose == PurposeType::Title),
        )
    }
}

/// Map a placeholder type, refined by the shape name, onto a purpose.
///
/// Footer, slide number, header and notes-image placeholders carry no slide
/// content and yield `None`.
fn purpose_for(placeholder_type: &str, name_key: &str) -> Option<PurposeType> {
    let purpose = match placeholder_type {
        "title" | "ctrTitle" => PurposeType::Title,
        "subTitle" => PurposeType::Subtitle,
        "dt" => PurposeType::Date,
        "pic" | "clipArt" | "media" => PurposeType::Image,
        "chart" | "dgm" => PurposeType::Chart,
        "ftr" | "sldNum" | "hdr" | "sldImg" => return None,
        "body" => PurposeType::Body,
        _ => PurposeType::Bullets,
    };

    if !purpose.is_text() {
        return Some(purpose);
    }

    let refined = if name_key.contains("heading") {
        PurposeType::Heading
    } else if name_key.contains("quote") {
        PurposeType::Quote
    } else if name_key.contains("name") || name_key.contains("attribution") {
        PurposeType::Attribution
    } else {
        purpose
    };

    Some(refined)
}

/// Column from a shape's horizontal center.
fn column_for(center: f64, slide_width: f64) -> ColumnAffinity {
    if center < slide_width * 0.4 {
        ColumnAffinity::Left
    } else if center > slide_width * 0.6 {
        ColumnAffinity::Right
    } else {
        ColumnAffinity::None
    }
}

/// Structure from the layout's declared type, else from its placeholders.
fn structure_for(
    layout_type: Option<&str>,
    placeholders: &[PlaceholderDescriptor],
) -> StructureTag {
    match layout_type {
        Some("title") => StructureTag::TitleSlide,
        Some("secHead") => StructureTag::SectionHeader,
        Some("titleOnly") => StructureTag::TitleOnly,
        Some("blank") => StructureTag::Blank,
        Some("twoObj") | Some("twoTxTwoObj") | Some("twoColTx") => StructureTag::TwoColumnEqual,
        _ => infer_structure(placeholders),
    }
}

fn infer_structure(placeholders: &[PlaceholderDescriptor]) -> StructureTag {
    let count = |purpose: PurposeType| placeholders.iter().filter(|p| p.purpose == purpose).count();
    let text = placeholders.iter().filter(|p| p.purpose.is_text()).count();
    let charts = count(PurposeType::Chart);
    let images = count(PurposeType::Image);

    if placeholders.is_empty() {
        StructureTag::Blank
    } else if charts >= 2 {
        StructureTag::DualChart
    } else if charts == 1 && text > 0 {
        StructureTag::ChartWithText
    } else if charts == 1 {
        StructureTag::SingleChart
    } else if count(PurposeType::Quote) > 0 {
        StructureTag::Quote
    } else if images > 0 && text > 0 {
        StructureTag::ImageWithText
    } else if images > 0 {
        StructureTag::FullImage
    } else if text >= 3 {
        StructureTag::ThreeColumn
    } else if text == 2 {
        StructureTag::TwoColumnEqual
    } else if text == 1 {
        StructureTag::SingleColumn
    } else if count(PurposeType::Subtitle) > 0 {
        StructureTag::TitleSlide
    } else if count(PurposeType::Title) > 0 {
        StructureTag::TitleOnly
    } else {
        StructureTag::Freeform
    }
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a part number from a path like "ppt/slideLayouts/slideLayout12.xml".
fn extract_part_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
