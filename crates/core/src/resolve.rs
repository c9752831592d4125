//! Placeholder resolution: map a slide's content fields onto a layout's placeholders.
//!
//! Matching is by naming convention. Each placeholder's match key is checked
//! against an ordered rule table; the first rule whose key substring appears
//! in the name AND whose content field is present decides the placeholder's
//! value, even when that decision is "nothing" (an out-of-range heading or an
//! empty bullet list). Later rules are not consulted after a rule matches.

use crate::types::{
    CanonicalSlide, ContentBag, ContentValue, ImageDescriptor, LayoutDescriptor,
    PlaceholderAssignment, PlaceholderDescriptor, PlaceholderValue, SlideRenderPlan,
};
use regex::Regex;
use std::sync::LazyLock;

/// First run of ASCII digits in a placeholder name.
static DIGIT_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Result of applying one rule to one placeholder.
enum RuleOutcome {
    /// The rule's content field is absent; try the next rule.
    NotApplicable,
    /// The rule decided this placeholder, possibly leaving it empty.
    Matched(Option<PlaceholderValue>),
}

struct MatchRule {
    /// Any of these substrings in the match key selects the rule.
    keys: &'static [&'static str],
    apply: fn(&str, &ContentBag) -> RuleOutcome,
}

/// Rules in priority order.
const RULES: &[MatchRule] = &[
    MatchRule {
        keys: &["title"],
        apply: title_rule,
    },
    MatchRule {
        keys: &["subtitle"],
        apply: subtitle_rule,
    },
    MatchRule {
        keys: &["date"],
        apply: date_rule,
    },
    MatchRule {
        keys: &["heading"],
        apply: heading_rule,
    },
    MatchRule {
        keys: &["content", "text"],
        apply: body_rule,
    },
    MatchRule {
        keys: &["picture", "image"],
        apply: image_rule,
    },
    MatchRule {
        keys: &["quote"],
        apply: quote_rule,
    },
    MatchRule {
        keys: &["name", "attribution"],
        apply: attribution_rule,
    },
];

fn scalar(content: &ContentBag, field: &str) -> RuleOutcome {
    match content.get(field) {
        Some(value) => RuleOutcome::Matched(Some(PlaceholderValue::Scalar(value.to_text()))),
        None => RuleOutcome::NotApplicable,
    }
}

fn title_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    scalar(content, "title")
}

fn subtitle_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    scalar(content, "subtitle")
}

fn date_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    scalar(content, "date")
}

fn quote_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    scalar(content, "quote")
}

fn attribution_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    scalar(content, "attribution")
}

fn heading_rule(key: &str, content: &ContentBag) -> RuleOutcome {
    let Some(headings) = content.get("headings") else {
        return RuleOutcome::NotApplicable;
    };

    let value = headings
        .items()
        .get(heading_ordinal(key))
        .cloned()
        .map(PlaceholderValue::Scalar);

    RuleOutcome::Matched(value)
}

fn body_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    if let Some(bullets) = content.get("bullets") {
        return RuleOutcome::Matched(bullet_expansion(bullets.items()));
    }

    match content.get("content") {
        Some(ContentValue::List(items)) => RuleOutcome::Matched(bullet_expansion(items)),
        Some(ContentValue::Text(text)) => {
            RuleOutcome::Matched(Some(PlaceholderValue::Scalar(text.clone())))
        }
        None => RuleOutcome::NotApplicable,
    }
}

fn image_rule(_key: &str, content: &ContentBag) -> RuleOutcome {
    match content.get("image") {
        Some(value) => RuleOutcome::Matched(Some(PlaceholderValue::Image(ImageDescriptor {
            description: value.to_text(),
        }))),
        None => RuleOutcome::NotApplicable,
    }
}

/// Bullets as paragraphs. An empty list leaves the placeholder untouched.
fn bullet_expansion(items: &[String]) -> Option<PlaceholderValue> {
    if items.is_empty() {
        None
    } else {
        Some(PlaceholderValue::Sequence(items.to_vec()))
    }
}

/// Zero-based heading ordinal from the first digit run in a name.
///
/// "Heading 2" is ordinal 1; a name without digits (or "Heading 0") is ordinal 0.
pub fn heading_ordinal(name: &str) -> usize {
    DIGIT_RUN_REGEX
        .find(name)
        .map(|m| m.as_str().parse::<usize>().unwrap_or(usize::MAX))
        .map(|n| n.saturating_sub(1))
        .unwrap_or(0)
}

/// Assigns slide content to layout placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResolver;

impl PlaceholderResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one slide against its layout.
    ///
    /// Assignments follow the layout's placeholder order. Placeholders no
    /// rule matches are omitted; `required` is not enforced here.
    pub fn resolve(&self, slide: &CanonicalSlide, layout: &LayoutDescriptor) -> SlideRenderPlan {
        let mut plan = SlideRenderPlan::new(layout.id);

        for placeholder in &layout.placeholders {
            if let Some(value) = self.resolve_placeholder(placeholder, &slide.content) {
                plan.assignments.push(PlaceholderAssignment {
                    raw_name: placeholder.raw_name.clone(),
                    value,
                });
            }
        }

        plan
    }

    /// Decide the value for a single placeholder.
    pub fn resolve_placeholder(
        &self,
        placeholder: &PlaceholderDescriptor,
        content: &ContentBag,
    ) -> Option<PlaceholderValue> {
        let key = placeholder.match_key();

        for rule in RULES {
            if !rule.keys.iter().any(|k| key.contains(k)) {
                continue;
            }
            if let RuleOutcome::Matched(value) = (rule.apply)(&key, content) {
                if value.is_none() {
                    log::debug!(
                        "Placeholder '{}' matched '{}' but has nothing to show",
                        placeholder.raw_name,
                        rule.keys[0]
                    );
                }
                return value;
            }
        }

        None
    }

    /// Required placeholders that the plan left unassigned.
    pub fn missing_required<'a>(
        &self,
        plan: &SlideRenderPlan,
        layout: &'a LayoutDescriptor,
    ) -> Vec<&'a PlaceholderDescriptor> {
        layout
            .placeholders
            .iter()
            .filter(|p| p.required && plan.get(&p.raw_name).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LayoutRegistry;
    use crate::types::{PurposeType, StructureTag};

    fn layout(names: &[(&str, PurposeType)]) -> LayoutDescriptor {
        names.iter().fold(
            LayoutDescriptor::new(1, "Test", StructureTag::Freeform),
            |layout, (name, purpose)| {
                layout.with_placeholder(PlaceholderDescriptor::new(*name, *purpose))
            },
        )
    }

    fn slide(fields: &[(&str, ContentValue)]) -> CanonicalSlide {
        let mut content = ContentBag::new();
        for (key, value) in fields {
            content.insert(*key, value.clone());
        }
        CanonicalSlide::with_content(1, content)
    }

    fn list(items: &[&str]) -> ContentValue {
        ContentValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    fn text(s: &str) -> PlaceholderValue {
        PlaceholderValue::Scalar(s.to_string())
    }

    #[test]
    fn test_heading_ordinal() {
        assert_eq!(heading_ordinal("heading"), 0);
        assert_eq!(heading_ordinal("heading 1"), 0);
        assert_eq!(heading_ordinal("heading 2"), 1);
        assert_eq!(heading_ordinal("heading 12 (copy 3)"), 11);
        assert_eq!(heading_ordinal("heading 0"), 0);
    }

    #[test]
    fn test_indexed_heading_out_of_range() {
        let layout = layout(&[
            ("heading", PurposeType::Heading),
            ("heading 2", PurposeType::Heading),
        ]);
        let plan = PlaceholderResolver::new()
            .resolve(&slide(&[("headings", list(&["Alpha"]))]), &layout);

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.get("heading"), Some(&text("Alpha")));
        assert_eq!(plan.get("heading 2"), None);
    }

    #[test]
    fn test_empty_bullets_leave_body_untouched() {
        let layout = layout(&[
            ("Title 1", PurposeType::Title),
            ("Content Placeholder 2", PurposeType::Bullets),
        ]);
        let plan = PlaceholderResolver::new().resolve(
            &slide(&[
                ("title", ContentValue::from("Agenda")),
                ("bullets", list(&[])),
                ("content", ContentValue::from("never used")),
            ]),
            &layout,
        );

        assert_eq!(plan.get("Title 1"), Some(&text("Agenda")));
        assert_eq!(plan.get("Content Placeholder 2"), None);
    }

    #[test]
    fn test_bullets_expand_to_sequence() {
        let layout = layout(&[("Content Placeholder 2", PurposeType::Bullets)]);
        let plan = PlaceholderResolver::new()
            .resolve(&slide(&[("bullets", list(&["One", "Two"]))]), &layout);

        assert_eq!(
            plan.get("Content Placeholder 2"),
            Some(&PlaceholderValue::Sequence(vec!["One".to_string(), "Two".to_string()]))
        );
    }

    #[test]
    fn test_content_scalar_and_list() {
        let layout = layout(&[("Text Placeholder 3", PurposeType::Body)]);
        let resolver = PlaceholderResolver::new();

        let plan = resolver.resolve(&slide(&[("content", ContentValue::from("Prose"))]), &layout);
        assert_eq!(plan.get("Text Placeholder 3"), Some(&text("Prose")));

        let plan = resolver.resolve(&slide(&[("content", list(&["a", "b"]))]), &layout);
        assert_eq!(plan.get("Text Placeholder 3").map(|v| v.kind()), Some("sequence"));
    }

    #[test]
    fn test_title_rule_precedes_subtitle() {
        let layout = layout(&[
            ("Title 1", PurposeType::Title),
            ("Subtitle 2", PurposeType::Subtitle),
        ]);
        let resolver = PlaceholderResolver::new();

        // "subtitle" contains "title", so the title rule claims it first
        let both = slide(&[
            ("title", ContentValue::from("Main")),
            ("subtitle", ContentValue::from("Sub")),
        ]);
        let plan = resolver.resolve(&both, &layout);
        assert_eq!(plan.get("Subtitle 2"), Some(&text("Main")));

        let only_subtitle = slide(&[("subtitle", ContentValue::from("Sub"))]);
        let plan = resolver.resolve(&only_subtitle, &layout);
        assert_eq!(plan.get("Title 1"), None);
        assert_eq!(plan.get("Subtitle 2"), Some(&text("Sub")));
    }

    #[test]
    fn test_date_picture_quote_attribution() {
        let layout = layout(&[
            ("Date Placeholder 3", PurposeType::Date),
            ("Picture Placeholder 1", PurposeType::Image),
            ("Quote Placeholder 2", PurposeType::Quote),
            ("Name Placeholder 4", PurposeType::Attribution),
            ("Chart Placeholder 5", PurposeType::Chart),
        ]);
        let plan = PlaceholderResolver::new().resolve(
            &slide(&[
                ("date", ContentValue::from("October 18, 2026")),
                ("image", ContentValue::from("sunrise over a harbor")),
                ("quote", ContentValue::from("Stay curious")),
                ("attribution", ContentValue::from("A. Reader")),
            ]),
            &layout,
        );

        assert_eq!(plan.get("Date Placeholder 3"), Some(&text("October 18, 2026")));
        assert_eq!(
            plan.get("Picture Placeholder 1"),
            Some(&PlaceholderValue::Image(ImageDescriptor {
                description: "sunrise over a harbor".to_string()
            }))
        );
        assert_eq!(plan.get("Quote Placeholder 2"), Some(&text("Stay curious")));
        assert_eq!(plan.get("Name Placeholder 4"), Some(&text("A. Reader")));
        assert_eq!(plan.get("Chart Placeholder 5"), None);
    }

    #[test]
    fn test_rule_without_content_falls_through() {
        // "text" selects the body rule, which has no field here; "name" then applies
        let layout = layout(&[("Caption Text Name", PurposeType::Attribution)]);
        let plan = PlaceholderResolver::new()
            .resolve(&slide(&[("attribution", ContentValue::from("Credit"))]), &layout);
        assert_eq!(plan.get("Caption Text Name"), Some(&text("Credit")));
    }

    #[test]
    fn test_matched_rule_does_not_fall_through() {
        let layout = layout(&[("Heading 3 Text", PurposeType::Heading)]);
        let plan = PlaceholderResolver::new().resolve(
            &slide(&[
                ("headings", list(&["Only one"])),
                ("content", ContentValue::from("Body")),
            ]),
            &layout,
        );
        assert!(plan.assignments.is_empty());
    }

    #[test]
    fn test_semantic_name_used_when_raw_name_blank() {
        let layout = LayoutDescriptor::new(2, "Quote", StructureTag::Quote).with_placeholder(
            PlaceholderDescriptor::new("", PurposeType::Quote).with_semantic_name("PullQuote_Main"),
        );
        let plan = PlaceholderResolver::new()
            .resolve(&slide(&[("quote", ContentValue::from("Hi"))]), &layout);
        assert_eq!(plan.get(""), Some(&text("Hi")));
    }

    #[test]
    fn test_plan_uses_layout_id_and_declared_order() {
        let layout = layout(&[
            ("Text Placeholder 2", PurposeType::Body),
            ("Title 1", PurposeType::Title),
        ]);
        let plan = PlaceholderResolver::new().resolve(
            &slide(&[
                ("title", ContentValue::from("T")),
                ("content", ContentValue::from("C")),
            ]),
            &layout,
        );
        assert_eq!(plan.layout_id, 1);
        let names: Vec<_> = plan.assignments.iter().map(|a| a.raw_name.as_str()).collect();
        assert_eq!(names, vec!["Text Placeholder 2", "Title 1"]);
    }

    #[test]
    fn test_never_assigns_undeclared_placeholders() {
        let registry = LayoutRegistry::builtin().unwrap();
        let resolver = PlaceholderResolver::new();
        let everything = slide(&[
            ("title", ContentValue::from("T")),
            ("subtitle", ContentValue::from("S")),
            ("date", ContentValue::from("D")),
            ("headings", list(&["H1", "H2", "H3"])),
            ("bullets", list(&["B1", "B2"])),
            ("image", ContentValue::from("I")),
            ("quote", ContentValue::from("Q")),
            ("attribution", ContentValue::from("A")),
            ("unrelated", ContentValue::from("U")),
        ]);

        for layout in registry.all() {
            let plan = resolver.resolve(&everything, layout);
            for assignment in &plan.assignments {
                assert!(
                    layout.placeholder(&assignment.raw_name).is_some(),
                    "layout {} got undeclared '{}'",
                    layout.id,
                    assignment.raw_name
                );
            }
        }
    }

    #[test]
    fn test_missing_required() {
        let layout = LayoutDescriptor::new(9, "Quote", StructureTag::Quote)
            .with_placeholder(
                PlaceholderDescriptor::new("Quote Placeholder 1", PurposeType::Quote)
                    .with_required(true),
            )
            .with_placeholder(PlaceholderDescriptor::new(
                "Name Placeholder 2",
                PurposeType::Attribution,
            ));
        let resolver = PlaceholderResolver::new();
        let plan = resolver.resolve(&slide(&[("attribution", ContentValue::from("Me"))]), &layout);

        let missing = resolver.missing_required(&plan, &layout);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].raw_name, "Quote Placeholder 1");
    }
}
