//! Slide assembly: drive a raw spec through normalization, layout lookup and
//! placeholder resolution.

use crate::config::{PlannerConfig, RequiredPolicy};
use crate::error::{Error, Result};
use crate::normalize::{
    DescriptionNormalizer, MarkdownNormalizer, Normalized, Normalizer, SingleSlideNormalizer,
    SpecFormat, StructuredNormalizer,
};
use crate::registry::LayoutRegistry;
use crate::resolve::PlaceholderResolver;
use crate::types::{LayoutDescriptor, LayoutId, PlanWarning, SlideRenderPlan};
use serde::Serialize;
use serde_json::Value;

/// Render plans for a whole spec, in slide order, plus non-fatal warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub plans: Vec<SlideRenderPlan>,
    pub warnings: Vec<PlanWarning>,
}

/// Resolves presentation specs against a layout registry.
///
/// Holds no mutable state; one planner can serve concurrent callers.
pub struct Planner<'r> {
    registry: &'r LayoutRegistry,
    config: PlannerConfig,
    resolver: PlaceholderResolver,
    structured: StructuredNormalizer,
    markdown: MarkdownNormalizer,
    description: Box<dyn Normalizer>,
    single: SingleSlideNormalizer,
}

impl<'r> Planner<'r> {
    /// Create a planner.
    ///
    /// Fails when the configured fallback layout is not in the registry,
    /// since no slide could then be guaranteed a layout.
    pub fn new(registry: &'r LayoutRegistry, config: PlannerConfig) -> Result<Self> {
        let fallback = config.defaults.fallback;
        if !registry.contains(fallback) {
            return Err(Error::Configuration(format!(
                "fallback layout {} is not in the registry ({} layouts)",
                fallback,
                registry.len()
            )));
        }

        Ok(Self {
            registry,
            config,
            resolver: PlaceholderResolver::new(),
            structured: StructuredNormalizer::new(),
            markdown: MarkdownNormalizer::new(),
            description: Box::new(DescriptionNormalizer::new()),
            single: SingleSlideNormalizer::new(),
        })
    }

    /// Replace the free-text description normalizer.
    pub fn with_description_normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.description = Box::new(normalizer);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r LayoutRegistry {
        self.registry
    }

    /// Detect the spec's shape and normalize it into canonical slides.
    pub fn normalize(&self, spec: &Value) -> Normalized {
        let format = SpecFormat::detect(spec);
        log::debug!("Normalizing spec as {:?}", format);

        let normalizer: &dyn Normalizer = match format {
            SpecFormat::Structured => &self.structured,
            SpecFormat::Markdown => &self.markdown,
            SpecFormat::Description => self.description.as_ref(),
            SpecFormat::SingleSlide => &self.single,
        };

        normalizer.normalize(spec, &self.config.defaults)
    }

    /// Resolve a raw spec into render plans.
    ///
    /// Only configuration problems are errors. Unknown layout ids use the
    /// fallback layout; malformed slide entries are reported in
    /// [`Resolution::warnings`].
    pub fn resolve(&self, spec: &Value) -> Result<Resolution> {
        let mut normalized = self.normalize(spec);
        let mut warnings = std::mem::take(&mut normalized.warnings);
        let mut plans = Vec::with_capacity(normalized.slides.len());

        for (position, slide) in normalized.slides.iter().enumerate() {
            let source = normalized.source_of(position);
            let layout = self.layout_for(slide.layout_id)?;
            let plan = self.resolver.resolve(slide, layout);

            log::debug!(
                "Slide {} on layout {} ('{}'): {} assignments",
                position,
                layout.id,
                layout.semantic_name,
                plan.assignments.len()
            );

            let missing = self.resolver.missing_required(&plan, layout);
            match self.config.required_policy {
                RequiredPolicy::Ignore => {}
                RequiredPolicy::Warn => {
                    warnings.extend(missing.iter().map(|p| PlanWarning::RequiredPlaceholderEmpty {
                        slide: source,
                        layout_id: layout.id,
                        raw_name: p.raw_name.clone(),
                    }));
                }
                RequiredPolicy::Skip if !missing.is_empty() => {
                    let names: Vec<&str> = missing.iter().map(|p| p.raw_name.as_str()).collect();
                    log::warn!("Skipping slide {}: empty required {:?}", source, names);
                    warnings.push(PlanWarning::SlideSkipped {
                        slide: source,
                        reason: format!("required placeholders empty: {}", names.join(", ")),
                    });
                    continue;
                }
                RequiredPolicy::Skip => {}
            }

            plans.push(plan);
        }

        Ok(Resolution { plans, warnings })
    }

    /// Look up a layout, substituting the fallback for unknown ids.
    fn layout_for(&self, requested: LayoutId) -> Result<&'r LayoutDescriptor> {
        match self.registry.get(requested) {
            Err(Error::LayoutNotFound(_)) => {
                let fallback = self.config.defaults.fallback;
                log::info!(
                    "Layout {} not in registry, using fallback layout {}",
                    requested,
                    fallback
                );
                self.registry.get(fallback).map_err(|_| {
                    Error::Configuration(format!(
                        "fallback layout {} is not in the registry",
                        fallback
                    ))
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutDefaults;
    use crate::types::{
        CanonicalSlide, ContentValue, PlaceholderDescriptor, PlaceholderValue, PurposeType,
        StructureTag,
    };
    use serde_json::json;

    fn builtin() -> LayoutRegistry {
        LayoutRegistry::builtin().unwrap()
    }

    fn text(s: &str) -> PlaceholderValue {
        PlaceholderValue::Scalar(s.to_string())
    }

    #[test]
    fn test_markdown_spec_normalizes_to_title_slide() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();
        let spec = json!({"markdown": "# Q4 Results\n## Summary\n- Revenue up 15%\n- Costs down 8%"});

        let normalized = planner.normalize(&spec);
        assert_eq!(normalized.slides.len(), 1);
        assert_eq!(normalized.slides[0].layout_id, 0);
        assert_eq!(
            normalized.slides[0].content.get("bullets"),
            Some(&ContentValue::List(vec![
                "Revenue up 15%".to_string(),
                "Costs down 8%".to_string()
            ]))
        );

        let resolution = planner.resolve(&spec).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        assert_eq!(resolution.plans[0].layout_id, 0);
        assert_eq!(resolution.plans[0].get("Title 1"), Some(&text("Q4 Results")));
    }

    #[test]
    fn test_unknown_layout_uses_fallback() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();
        let spec = json!({"slides": [{"layout_index": 99, "content": {"title": "X"}}]});

        let resolution = planner.resolve(&spec).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        assert_eq!(resolution.plans[0].layout_id, 0);
        assert_eq!(resolution.plans[0].get("Title 1"), Some(&text("X")));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_missing_fallback_is_configuration_error() {
        let registry = builtin();
        let config = PlannerConfig::new().with_defaults(LayoutDefaults::new().with_fallback(40));
        assert!(matches!(
            Planner::new(&registry, config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_section_default_missing_falls_back() {
        let registry = builtin();
        let config = PlannerConfig::new().with_defaults(LayoutDefaults::new().with_section(77));
        let planner = Planner::new(&registry, config).unwrap();

        let resolution = planner.resolve(&json!({"markdown": "- lone bullet"})).unwrap();
        assert_eq!(resolution.plans[0].layout_id, 0);
    }

    #[test]
    fn test_slide_order_preserved() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();
        let spec = json!({"slides": [
            {"layout_index": 18, "content": {"quote": "Q"}},
            {"layout_index": 5, "content": {"title": "Points", "bullets": ["a", "b"]}},
            {"layout_index": 2, "content": {"title": "Part II"}}
        ]});

        let resolution = planner.resolve(&spec).unwrap();
        let ids: Vec<_> = resolution.plans.iter().map(|p| p.layout_id).collect();
        assert_eq!(ids, vec![18, 5, 2]);
        assert_eq!(
            resolution.plans[1].get("Content Placeholder 2"),
            Some(&PlaceholderValue::Sequence(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_malformed_entries_reported_not_fabricated() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();
        let spec = json!({"slides": [42, {"layout_index": 5, "content": {"title": "Kept"}}]});

        let resolution = planner.resolve(&spec).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        assert_eq!(resolution.warnings.len(), 1);
        assert!(matches!(
            resolution.warnings[0],
            PlanWarning::SlideSkipped { slide: 0, .. }
        ));
    }

    #[test]
    fn test_description_spec_with_pinned_date() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default())
            .unwrap()
            .with_description_normalizer(
                DescriptionNormalizer::new().with_date("October 18, 2026"),
            );

        let resolution = planner
            .resolve(&json!({"description": "Roll out the new intake process"}))
            .unwrap();

        assert_eq!(resolution.plans.len(), 2);
        assert_eq!(
            resolution.plans[0].get("Date Placeholder 3"),
            Some(&text("October 18, 2026"))
        );
        assert_eq!(resolution.plans[1].layout_id, 5);
        assert_eq!(
            resolution.plans[1].get("Content Placeholder 2"),
            Some(&text("Roll out the new intake process"))
        );
    }

    struct OneSlidePerParagraph;

    impl Normalizer for OneSlidePerParagraph {
        fn normalize(&self, spec: &Value, defaults: &LayoutDefaults) -> Normalized {
            let text = spec.get("description").and_then(Value::as_str).unwrap_or("");
            let slides = text
                .split("\n\n")
                .map(|para| {
                    let mut slide = CanonicalSlide::new(defaults.body);
                    slide.content.insert("content", para);
                    slide
                })
                .collect();
            Normalized {
                slides,
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_description_normalizer_is_swappable() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default())
            .unwrap()
            .with_description_normalizer(OneSlidePerParagraph);

        let resolution = planner
            .resolve(&json!({"description": "one\n\ntwo\n\nthree"}))
            .unwrap();
        assert_eq!(resolution.plans.len(), 3);
    }

    #[test]
    fn test_single_slide_shorthand() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();

        let spec = json!({"layout_index": 18, "quote": "Stay curious", "attribution": "A. Reader"});
        let resolution = planner.resolve(&spec).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        let plan = &resolution.plans[0];
        assert_eq!(plan.layout_id, 18);
        assert_eq!(plan.get("Quote Placeholder 1"), Some(&text("Stay curious")));
        assert_eq!(plan.get("Name Placeholder 2"), Some(&text("A. Reader")));
    }

    fn quote_registry() -> LayoutRegistry {
        LayoutRegistry::new(vec![
            LayoutDescriptor::new(0, "Quote", StructureTag::Quote)
                .with_placeholder(
                    PlaceholderDescriptor::new("Quote Placeholder 1", PurposeType::Quote)
                        .with_required(true),
                )
                .with_placeholder(PlaceholderDescriptor::new(
                    "Name Placeholder 2",
                    PurposeType::Attribution,
                )),
        ])
        .unwrap()
    }

    #[test]
    fn test_required_policy_ignore_emits_silently() {
        let registry = quote_registry();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();
        let resolution = planner.resolve(&json!({"attribution": "Me"})).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_required_policy_warn() {
        let registry = quote_registry();
        let config = PlannerConfig::new().with_required_policy(RequiredPolicy::Warn);
        let planner = Planner::new(&registry, config).unwrap();

        let resolution = planner.resolve(&json!({"attribution": "Me"})).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        assert_eq!(
            resolution.warnings,
            vec![PlanWarning::RequiredPlaceholderEmpty {
                slide: 0,
                layout_id: 0,
                raw_name: "Quote Placeholder 1".to_string()
            }]
        );
    }

    #[test]
    fn test_required_policy_skip() {
        let registry = quote_registry();
        let config = PlannerConfig::new().with_required_policy(RequiredPolicy::Skip);
        let planner = Planner::new(&registry, config).unwrap();

        let spec = json!({"slides": [
            {"content": {"attribution": "Me"}},
            {"content": {"quote": "Filled"}}
        ]});
        let resolution = planner.resolve(&spec).unwrap();
        assert_eq!(resolution.plans.len(), 1);
        assert_eq!(resolution.plans[0].get("Quote Placeholder 1"), Some(&text("Filled")));
        assert!(matches!(
            resolution.warnings[0],
            PlanWarning::SlideSkipped { slide: 0, .. }
        ));
    }

    #[test]
    fn test_skipped_slides_keep_spec_positions() {
        let registry = quote_registry();
        let config = PlannerConfig::new().with_required_policy(RequiredPolicy::Skip);
        let planner = Planner::new(&registry, config).unwrap();

        let spec = json!({"slides": [
            42,
            {"content": {"attribution": "Me"}},
            {"content": {"quote": "Filled"}}
        ]});
        let resolution = planner.resolve(&spec).unwrap();

        assert_eq!(resolution.plans.len(), 1);
        let skipped: Vec<usize> = resolution
            .warnings
            .iter()
            .map(|w| match w {
                PlanWarning::SlideSkipped { slide, .. } => *slide,
                other => panic!("unexpected warning {:?}", other),
            })
            .collect();
        assert_eq!(skipped, vec![0, 1]);
    }

    #[test]
    fn test_required_warning_uses_spec_position() {
        let registry = quote_registry();
        let config = PlannerConfig::new().with_required_policy(RequiredPolicy::Warn);
        let planner = Planner::new(&registry, config).unwrap();

        let spec = json!({"slides": ["bad", {"content": {"attribution": "Me"}}]});
        let resolution = planner.resolve(&spec).unwrap();

        assert_eq!(resolution.plans.len(), 1);
        assert_eq!(
            resolution.warnings[1],
            PlanWarning::RequiredPlaceholderEmpty {
                slide: 1,
                layout_id: 0,
                raw_name: "Quote Placeholder 1".to_string()
            }
        );
    }

    #[test]
    fn test_planner_accessors() {
        let registry = quote_registry();
        let config = PlannerConfig::new().with_required_policy(RequiredPolicy::Warn);
        let planner = Planner::new(&registry, config).unwrap();

        assert_eq!(planner.config().required_policy, RequiredPolicy::Warn);
        assert_eq!(planner.registry().len(), 1);
    }

    #[test]
    fn test_concurrent_resolution_shares_registry() {
        let registry = builtin();
        let planner = Planner::new(&registry, PlannerConfig::default()).unwrap();

        let specs = vec![
            json!({"markdown": "# A\n- one"}),
            json!({"slides": [{"layout_index": 3, "content": {"title": "B"}}]}),
            json!({"title": "C"}),
        ];

        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = specs
                .iter()
                .map(|spec| {
                    let planner = &planner;
                    scope.spawn(move || planner.resolve(spec).map(|r| r.plans.len()))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        assert_eq!(counts, vec![1, 1, 1]);
    }
}
