//! Domain types for layouts, slide content and resolved render plans.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

/// Key of a layout in the registry (its zero-based template position).
pub type LayoutId = usize;

/// Coarse arrangement of a layout's placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureTag {
    TitleSlide,
    SectionHeader,
    TitleOnly,
    SingleColumn,
    TwoColumnEqual,
    ThreeColumn,
    ChartWithText,
    SingleChart,
    DualChart,
    ImageWithText,
    FullImage,
    Quote,
    Blank,
    /// Anything the catalog does not classify.
    #[serde(other)]
    Freeform,
}

impl StructureTag {
    /// The tag as it appears in catalogs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TitleSlide => "title_slide",
            Self::SectionHeader => "section_header",
            Self::TitleOnly => "title_only",
            Self::SingleColumn => "single_column",
            Self::TwoColumnEqual => "two_column_equal",
            Self::ThreeColumn => "three_column",
            Self::ChartWithText => "chart_with_text",
            Self::SingleChart => "single_chart",
            Self::DualChart => "dual_chart",
            Self::ImageWithText => "image_with_text",
            Self::FullImage => "full_image",
            Self::Quote => "quote",
            Self::Blank => "blank",
            Self::Freeform => "freeform",
        }
    }
}

/// What a placeholder is meant to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeType {
    Title,
    Subtitle,
    Body,
    Bullets,
    Quote,
    Attribution,
    Chart,
    Image,
    Date,
    Heading,
}

impl PurposeType {
    /// The purpose as it appears in catalogs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Body => "body",
            Self::Bullets => "bullets",
            Self::Quote => "quote",
            Self::Attribution => "attribution",
            Self::Chart => "chart",
            Self::Image => "image",
            Self::Date => "date",
            Self::Heading => "heading",
        }
    }

    /// Whether the placeholder carries running text (body copy or bullets).
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Body | Self::Bullets)
    }
}

/// Column a placeholder sits in, for multi-column layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAffinity {
    #[default]
    None,
    Left,
    Right,
}

impl ColumnAffinity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// A named content slot inside a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderDescriptor {
    /// Name exposed by the underlying document placeholder ("Title 1").
    pub raw_name: String,

    /// Purpose-encoding name ("PresentationTitle_Primary").
    #[serde(default)]
    pub semantic_name: String,

    /// What the placeholder holds.
    pub purpose: PurposeType,

    /// Zero-based position among same-purpose siblings.
    /// Recomputed by the registry from declaration order.
    #[serde(default)]
    pub index: usize,

    /// Advisory only; never enforced by the resolver.
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub column: ColumnAffinity,

    /// Free-text authoring guidance.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_guideline: String,
}

impl PlaceholderDescriptor {
    /// Create a placeholder with the given raw name and purpose.
    pub fn new(raw_name: impl Into<String>, purpose: PurposeType) -> Self {
        Self {
            raw_name: raw_name.into(),
            semantic_name: String::new(),
            purpose,
            index: 0,
            required: false,
            column: ColumnAffinity::None,
            content_guideline: String::new(),
        }
    }

    pub fn with_semantic_name(mut self, name: impl Into<String>) -> Self {
        self.semantic_name = name.into();
        self
    }

    pub fn with_column(mut self, column: ColumnAffinity) -> Self {
        self.column = column;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Lowercase key used for name-convention matching.
    ///
    /// Uses the raw name, or the semantic name when the raw name is blank.
    pub fn match_key(&self) -> String {
        if self.raw_name.trim().is_empty() {
            match_key(&self.semantic_name)
        } else {
            match_key(&self.raw_name)
        }
    }
}

/// A named arrangement of placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub id: LayoutId,

    pub semantic_name: String,

    pub structure: StructureTag,

    /// Placeholders in declaration order.
    #[serde(default)]
    pub placeholders: Vec<PlaceholderDescriptor>,

    /// Broad grouping used by the recommender ("content", "data_visualization").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Content types this layout suits, used by the recommender.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
}

impl LayoutDescriptor {
    /// Create a layout with no placeholders.
    pub fn new(id: LayoutId, semantic_name: impl Into<String>, structure: StructureTag) -> Self {
        Self {
            id,
            semantic_name: semantic_name.into(),
            structure,
            placeholders: Vec::new(),
            category: None,
            use_cases: Vec::new(),
        }
    }

    /// Append a placeholder.
    pub fn with_placeholder(mut self, placeholder: PlaceholderDescriptor) -> Self {
        self.placeholders.push(placeholder);
        self
    }

    /// Find a placeholder by its raw name.
    pub fn placeholder(&self, raw_name: &str) -> Option<&PlaceholderDescriptor> {
        self.placeholders.iter().find(|p| p.raw_name == raw_name)
    }

    /// Number of placeholders with the given purpose.
    pub fn count_purpose(&self, purpose: PurposeType) -> usize {
        self.placeholders
            .iter()
            .filter(|p| p.purpose == purpose)
            .count()
    }

    /// Reassign each placeholder's `index` from its order among same-purpose siblings.
    pub(crate) fn assign_sibling_indices(&mut self) {
        let mut seen: BTreeMap<PurposeType, usize> = BTreeMap::new();
        for placeholder in &mut self.placeholders {
            let next = seen.entry(placeholder.purpose).or_insert(0);
            placeholder.index = *next;
            *next += 1;
        }
    }

    /// Summarize placeholders by purpose and column.
    pub fn summary(&self) -> PlaceholderSummary {
        let mut summary = PlaceholderSummary {
            total_count: self.placeholders.len(),
            ..Default::default()
        };

        for placeholder in &self.placeholders {
            *summary
                .by_purpose
                .entry(placeholder.purpose.as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .by_column
                .entry(placeholder.column.as_str().to_string())
                .or_insert(0) += 1;
            if placeholder.required {
                summary.required_count += 1;
            }
        }

        summary
    }
}

/// Placeholder counts for one layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderSummary {
    pub total_count: usize,
    pub by_purpose: BTreeMap<String, usize>,
    pub by_column: BTreeMap<String, usize>,
    pub required_count: usize,
}

/// A content field value: one string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Text(String),
    List(Vec<String>),
}

impl ContentValue {
    /// Convert a JSON value. Nulls and objects carry no slide content.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::List(items.iter().filter_map(scalar_text).collect())),
            other => scalar_text(other).map(Self::Text),
        }
    }

    /// The value as a single string; lists are joined by newlines.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join("\n"),
        }
    }

    /// The value as a list; a scalar is a one-item list.
    pub fn items(&self) -> &[String] {
        match self {
            Self::Text(text) => std::slice::from_ref(text),
            Self::List(items) => items,
        }
    }
}

impl From<&str> for ContentValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for ContentValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Content fields for one slide, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentBag(BTreeMap<String, ContentValue>);

impl ContentBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from a JSON object, skipping fields that hold no text.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut bag = Self::new();
        for (key, value) in object {
            match ContentValue::from_json(value) {
                Some(content) => bag.insert(key.clone(), content),
                None => log::debug!("Ignoring non-text content field '{}'", key),
            }
        }
        bag
    }

    pub fn get(&self, field: &str) -> Option<&ContentValue> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<ContentValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<ContentValue> {
        self.0.remove(field)
    }

    /// Append an item to a list field, creating it on first use.
    pub fn push_item(&mut self, field: &str, item: impl Into<String>) {
        let entry = self
            .0
            .entry(field.to_string())
            .or_insert_with(|| ContentValue::List(Vec::new()));
        if let ContentValue::Text(text) = entry {
            let first = std::mem::take(text);
            *entry = ContentValue::List(vec![first]);
        }
        if let ContentValue::List(items) = entry {
            items.push(item.into());
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContentValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All text in the bag, space separated, for content analysis.
    pub fn all_text(&self) -> String {
        self.0
            .values()
            .map(|v| v.items().join(" "))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A format-independent slide: a layout choice plus its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSlide {
    pub layout_id: LayoutId,
    pub content: ContentBag,
}

impl CanonicalSlide {
    pub fn new(layout_id: LayoutId) -> Self {
        Self {
            layout_id,
            content: ContentBag::new(),
        }
    }

    pub fn with_content(layout_id: LayoutId, content: ContentBag) -> Self {
        Self { layout_id, content }
    }
}

/// Opaque image request forwarded to an image-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub description: String,
}

/// Value written into one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PlaceholderValue {
    /// Plain text replacing the placeholder's text.
    Scalar(String),
    /// Bullets: the first fills the primary text run, each later one
    /// becomes its own paragraph at level 0.
    Sequence(Vec<String>),
    /// An image to synthesize from a description.
    Image(ImageDescriptor),
}

impl PlaceholderValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Image(_) => "image",
        }
    }
}

/// Assignment of a value to a placeholder by raw name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderAssignment {
    pub raw_name: String,
    #[serde(flatten)]
    pub value: PlaceholderValue,
}

/// A fully resolved slide, ready for a document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRenderPlan {
    pub layout_id: LayoutId,
    pub assignments: Vec<PlaceholderAssignment>,
}

impl SlideRenderPlan {
    pub fn new(layout_id: LayoutId) -> Self {
        Self {
            layout_id,
            assignments: Vec::new(),
        }
    }

    /// Look up the value assigned to a placeholder.
    pub fn get(&self, raw_name: &str) -> Option<&PlaceholderValue> {
        self.assignments
            .iter()
            .find(|a| a.raw_name == raw_name)
            .map(|a| &a.value)
    }
}

/// Non-fatal issue reported alongside resolved plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// A slide was dropped. `slide` is the entry's position in the spec's
    /// slide list (the slide's position for outline and free-text specs).
    SlideSkipped { slide: usize, reason: String },

    /// A required placeholder received no content. `slide` is numbered as
    /// for [`PlanWarning::SlideSkipped`].
    RequiredPlaceholderEmpty {
        slide: usize,
        layout_id: LayoutId,
        raw_name: String,
    },
}

/// Fold a name into its matching key: NFKC normalized and lowercased.
pub fn match_key(name: &str) -> String {
    name.nfkc().collect::<String>().to_lowercase()
}
