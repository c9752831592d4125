//! Format normalizers: turn a raw presentation spec into canonical slides.
//!
//! Four shapes are recognized, tried in a fixed order by [`SpecFormat::detect`]:
//! an explicit slide list, a Markdown outline, a free-text description, and
//! finally a single slide given as a bare content object.

use crate::config::LayoutDefaults;
use crate::error::Error;
use crate::types::{CanonicalSlide, ContentBag, ContentValue, LayoutId, PlanWarning};
use serde_json::{Map, Value};

/// Slides produced by a normalizer, with any entries it had to drop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub slides: Vec<CanonicalSlide>,
    pub warnings: Vec<PlanWarning>,
    /// Spec entry each slide came from, parallel to `slides`. Left empty
    /// when slides map one-to-one onto their positions.
    pub sources: Vec<usize>,
}

impl Normalized {
    fn from_slides(slides: Vec<CanonicalSlide>) -> Self {
        Self {
            slides,
            ..Default::default()
        }
    }

    /// Spec entry that produced the slide at `position`.
    pub fn source_of(&self, position: usize) -> usize {
        self.sources.get(position).copied().unwrap_or(position)
    }
}

/// Converts one spec shape into canonical slides.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, spec: &Value, defaults: &LayoutDefaults) -> Normalized;
}

/// The shape of a raw spec, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    /// `{"slides": [...]}` or a bare array.
    Structured,
    /// `{"markdown": "..."}`.
    Markdown,
    /// `{"description": "..."}` or a bare string.
    Description,
    /// Anything else: one slide.
    SingleSlide,
}

impl SpecFormat {
    /// Detect the spec shape. The first matching shape wins.
    pub fn detect(spec: &Value) -> Self {
        match spec {
            Value::Array(_) => Self::Structured,
            Value::String(_) => Self::Description,
            Value::Object(map) => {
                if map.get("slides").is_some_and(Value::is_array) {
                    Self::Structured
                } else if map.get("markdown").is_some_and(Value::is_string) {
                    Self::Markdown
                } else if map.get("description").is_some_and(Value::is_string) {
                    Self::Description
                } else {
                    Self::SingleSlide
                }
            }
            _ => Self::SingleSlide,
        }
    }
}

/// Read `layout_index` from a slide object, falling back when absent or unusable.
fn read_layout_index(object: &Map<String, Value>, fallback: LayoutId) -> LayoutId {
    match object.get("layout_index") {
        None | Some(Value::Null) => fallback,
        Some(value) => parse_layout_index(value).unwrap_or_else(|| {
            log::warn!(
                "Unusable layout_index {}, using fallback layout {}",
                value,
                fallback
            );
            fallback
        }),
    }
}

fn parse_layout_index(value: &Value) -> Option<LayoutId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| LayoutId::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Passes an explicit slide list through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredNormalizer;

impl StructuredNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn slide_from_entry(
        entry: &Value,
        index: usize,
        defaults: &LayoutDefaults,
    ) -> crate::Result<CanonicalSlide> {
        let object = entry.as_object().ok_or_else(|| Error::Validation {
            index,
            reason: "slide entry is not an object".to_string(),
        })?;

        let content = match object.get("content") {
            None | Some(Value::Null) => ContentBag::new(),
            Some(Value::Object(map)) => ContentBag::from_json_object(map),
            Some(_) => {
                return Err(Error::Validation {
                    index,
                    reason: "content is not an object".to_string(),
                })
            }
        };

        Ok(CanonicalSlide::with_content(
            read_layout_index(object, defaults.fallback),
            content,
        ))
    }
}

impl Normalizer for StructuredNormalizer {
    fn normalize(&self, spec: &Value, defaults: &LayoutDefaults) -> Normalized {
        let entries: &[Value] = match spec {
            Value::Array(entries) => entries,
            _ => spec
                .get("slides")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        };

        let mut out = Normalized::default();

        for (index, entry) in entries.iter().enumerate() {
            match Self::slide_from_entry(entry, index, defaults) {
                Ok(slide) => {
                    out.slides.push(slide);
                    out.sources.push(index);
                }
                Err(e) => {
                    log::warn!("Skipping slide: {}", e);
                    let reason = match e {
                        Error::Validation { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    out.warnings.push(PlanWarning::SlideSkipped {
                        slide: index,
                        reason,
                    });
                }
            }
        }

        out
    }
}

/// Line-oriented Markdown outline reader.
///
/// - `# Title` opens a title-layout slide.
/// - `## Text` sets the open slide's subtitle, or opens a section slide titled `Text`.
/// - `- Item` appends a bullet, opening a section slide if needed.
///
/// Every other line is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse outline text into slides.
    pub fn parse(&self, text: &str, defaults: &LayoutDefaults) -> Vec<CanonicalSlide> {
        let mut slides = Vec::new();
        let mut current: Option<CanonicalSlide> = None;

        for line in text.trim().lines() {
            if let Some(rest) = line.strip_prefix("# ") {
                if let Some(done) = current.take() {
                    slides.push(done);
                }
                let mut slide = CanonicalSlide::new(defaults.title);
                slide.content.insert("title", rest.trim());
                current = Some(slide);
            } else if let Some(rest) = line.strip_prefix("## ") {
                match current.as_mut() {
                    Some(slide) => slide.content.insert("subtitle", rest.trim()),
                    None => {
                        let mut slide = CanonicalSlide::new(defaults.section);
                        slide.content.insert("title", rest.trim());
                        current = Some(slide);
                    }
                }
            } else if let Some(rest) = line.strip_prefix("- ") {
                current
                    .get_or_insert_with(|| CanonicalSlide::new(defaults.section))
                    .content
                    .push_item("bullets", rest.trim());
            }
        }

        if let Some(done) = current {
            slides.push(done);
        }

        slides
    }

    /// Render slides back into outline text.
    ///
    /// Only titles, subtitles and bullets are written. A slide on a layout
    /// other than `defaults.title` is written with `## `, which the outline
    /// format can only express as the first slide.
    pub fn render(&self, slides: &[CanonicalSlide], defaults: &LayoutDefaults) -> String {
        let mut lines = Vec::new();

        for slide in slides {
            let title = slide.content.get("title").map(ContentValue::to_text);
            let subtitle = slide.content.get("subtitle").map(ContentValue::to_text);
            let bullets = slide
                .content
                .get("bullets")
                .map(|b| b.items().to_vec())
                .unwrap_or_default();

            match &title {
                Some(t) if slide.layout_id == defaults.title => lines.push(format!("# {}", t)),
                Some(t) => lines.push(format!("## {}", t)),
                None => {}
            }

            if title.is_some() {
                if let Some(s) = &subtitle {
                    lines.push(format!("## {}", s));
                }
                lines.extend(bullets.iter().map(|b| format!("- {}", b)));
            } else {
                lines.extend(bullets.iter().map(|b| format!("- {}", b)));
                if let Some(s) = &subtitle {
                    lines.push(format!("## {}", s));
                }
            }
        }

        lines.join("\n")
    }
}

impl Normalizer for MarkdownNormalizer {
    fn normalize(&self, spec: &Value, defaults: &LayoutDefaults) -> Normalized {
        let text = spec.get("markdown").and_then(Value::as_str).unwrap_or("");
        Normalized::from_slides(self.parse(text, defaults))
    }
}

/// Fixed two-slide template for free-text descriptions.
///
/// Makes no attempt to understand the text: the title slide is generic and
/// the whole description lands on one body slide.
#[derive(Debug, Clone, Default)]
pub struct DescriptionNormalizer {
    /// Pinned date for the title slide; today when unset.
    date: Option<String>,
}

impl DescriptionNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed date string instead of today's date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    fn date_text(&self) -> String {
        self.date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%B %d, %Y").to_string())
    }
}

impl Normalizer for DescriptionNormalizer {
    fn normalize(&self, spec: &Value, defaults: &LayoutDefaults) -> Normalized {
        let description = match spec {
            Value::String(text) => text.as_str(),
            _ => spec.get("description").and_then(Value::as_str).unwrap_or(""),
        };

        let mut title = CanonicalSlide::new(defaults.title);
        title.content.insert("title", "Presentation");
        title.content.insert("subtitle", "Generated from description");
        title.content.insert("date", self.date_text());

        let mut body = CanonicalSlide::new(defaults.body);
        body.content.insert("title", "Content");
        body.content.insert("content", description);

        Normalized::from_slides(vec![title, body])
    }
}

/// Treats the whole spec as one slide.
///
/// An object with a `content` object is read as a slide entry; any other
/// object is itself the content bag, minus `layout_index`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSlideNormalizer;

impl SingleSlideNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for SingleSlideNormalizer {
    fn normalize(&self, spec: &Value, defaults: &LayoutDefaults) -> Normalized {
        let slide = match spec {
            Value::Object(map) => {
                let layout_id = read_layout_index(map, defaults.fallback);
                let content = match map.get("content") {
                    Some(Value::Object(inner)) => ContentBag::from_json_object(inner),
                    _ => {
                        let mut bag = ContentBag::from_json_object(map);
                        bag.remove("layout_index");
                        bag
                    }
                };
                CanonicalSlide::with_content(layout_id, content)
            }
            _ => CanonicalSlide::new(defaults.fallback),
        };

        Normalized::from_slides(vec![slide])
    }
}
