//! Core of the slide planner: layout registry, spec normalizers, placeholder
//! resolution and slide assembly.
//!
//! A raw spec (slide list, Markdown outline, free-text description or a
//! single content object) goes in; an ordered list of [`SlideRenderPlan`]s
//! comes out, each naming a registry layout and the values for its
//! placeholders.

pub mod assemble;
pub mod config;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod select;
pub mod types;

pub use assemble::{Planner, Resolution};
pub use config::{LayoutDefaults, PlannerConfig, RequiredPolicy};
pub use error::{Error, Result};
pub use normalize::{
    DescriptionNormalizer, MarkdownNormalizer, Normalized, Normalizer, SingleSlideNormalizer,
    SpecFormat, StructuredNormalizer,
};
pub use registry::LayoutRegistry;
pub use resolve::PlaceholderResolver;
pub use select::{ContentAnalysis, LayoutSelector, Recommendation};
pub use types::{
    CanonicalSlide, ColumnAffinity, ContentBag, ContentValue, ImageDescriptor, LayoutDescriptor,
    LayoutId, PlaceholderAssignment, PlaceholderDescriptor, PlaceholderSummary, PlaceholderValue,
    PlanWarning, PurposeType, SlideRenderPlan, StructureTag,
};
