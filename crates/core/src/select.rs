//! Content-aware layout recommendations.
//!
//! Scores every registry layout against a quick keyword analysis of a slide's
//! content. Advisory only: the planner never calls this, callers pick a
//! `layout_index` from the results if they want to.

use crate::registry::LayoutRegistry;
use crate::types::{ContentBag, ContentValue, LayoutDescriptor, LayoutId, PurposeType};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static CHART_WORDS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(chart|graph|revenue|growth|trend|data|metric|kpi)").unwrap()
});

static TABLE_WORDS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(table|comparison|versus|compare|vs\b)").unwrap());

static IMAGE_WORDS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(image|photo|picture|visual|diagram)").unwrap());

static COMPARISON_PHRASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(versus|compared to|vs|while)\b").unwrap());

static SEQUENCE_WORDS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(first|second|third|finally)\b").unwrap());

/// Numbers, percentages and dollar amounts.
static DATA_POINT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*%?|\$\d+").unwrap());

/// Content field names that signal a side-by-side comparison.
const COMPARISON_KEYS: &[&str] = &["left", "right", "before", "after", "vs"];

const METRIC_KEYWORDS: &[&str] = &[
    "revenue",
    "profit",
    "ebitda",
    "growth",
    "margin",
    "roi",
    "kpi",
    "cost",
    "efficiency",
    "utilization",
    "occupancy",
    "satisfaction",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Dashboard,
    DataVisualization,
    DataTable,
    Narrative,
    Comparison,
    BulletPoints,
    GeneralContent,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::DataVisualization => "data_visualization",
            Self::DataTable => "data_table",
            Self::Narrative => "narrative",
            Self::Comparison => "comparison",
            Self::BulletPoints => "bullet_points",
            Self::GeneralContent => "general_content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDensity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStructure {
    Comparison,
    List,
    Narrative,
    SingleTopic,
}

/// Keyword-level characteristics of a slide's content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub content_type: ContentType,
    pub has_charts: bool,
    pub has_tables: bool,
    pub has_images: bool,
    pub text_density: TextDensity,
    pub structure: ContentStructure,
    pub data_points: usize,
    pub key_metrics: Vec<String>,
}

/// One scored layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub layout_id: LayoutId,
    pub score: f64,
    pub reason: String,
}

/// Ranks layouts for a content bag.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutSelector;

impl LayoutSelector {
    pub fn new() -> Self {
        Self
    }

    /// Analyze content characteristics.
    pub fn analyze(&self, content: &ContentBag) -> ContentAnalysis {
        let text = content.all_text();
        let lower = text.to_lowercase();

        let has_charts = CHART_WORDS_REGEX.is_match(&text);
        let has_tables = TABLE_WORDS_REGEX.is_match(&text);
        let has_images = IMAGE_WORDS_REGEX.is_match(&text);

        let text_density = match text.split_whitespace().count() {
            n if n < 20 => TextDensity::Low,
            n if n < 100 => TextDensity::Medium,
            _ => TextDensity::High,
        };

        let structure = analyze_structure(content, &text);
        let data_points = DATA_POINT_REGEX.find_iter(&text).count();
        let key_metrics = METRIC_KEYWORDS
            .iter()
            .filter(|k| lower.contains(*k))
            .map(|k| k.to_string())
            .collect();

        let content_type = if has_charts && has_tables {
            ContentType::Dashboard
        } else if has_charts {
            ContentType::DataVisualization
        } else if has_tables {
            ContentType::DataTable
        } else if text_density == TextDensity::High {
            ContentType::Narrative
        } else if structure == ContentStructure::Comparison {
            ContentType::Comparison
        } else if structure == ContentStructure::List {
            ContentType::BulletPoints
        } else {
            ContentType::GeneralContent
        };

        ContentAnalysis {
            content_type,
            has_charts,
            has_tables,
            has_images,
            text_density,
            structure,
            data_points,
            key_metrics,
        }
    }

    /// Best `top_n` layouts for the content, highest score first.
    ///
    /// Equal scores keep registry order.
    pub fn recommend(
        &self,
        registry: &LayoutRegistry,
        content: &ContentBag,
        top_n: usize,
    ) -> Vec<Recommendation> {
        let analysis = self.analyze(content);
        log::debug!("Content analysis: {:?}", analysis);

        let mut ranked: Vec<Recommendation> = registry
            .all()
            .iter()
            .map(|layout| {
                let score = score_layout(&analysis, layout);
                Recommendation {
                    layout_id: layout.id,
                    score,
                    reason: explain(&analysis, layout, score),
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);
        ranked
    }
}

fn analyze_structure(content: &ContentBag, text: &str) -> ContentStructure {
    if content.iter().any(|(key, _)| COMPARISON_KEYS.contains(&key)) {
        return ContentStructure::Comparison;
    }
    if content
        .iter()
        .any(|(_, value)| matches!(value, ContentValue::List(_)))
    {
        return ContentStructure::List;
    }

    if COMPARISON_PHRASE_REGEX.is_match(text) {
        ContentStructure::Comparison
    } else if SEQUENCE_WORDS_REGEX.is_match(text) {
        ContentStructure::List
    } else if text.split('.').count() > 3 {
        ContentStructure::Narrative
    } else {
        ContentStructure::SingleTopic
    }
}

fn score_layout(analysis: &ContentAnalysis, layout: &LayoutDescriptor) -> f64 {
    let mut score = 0.0;
    let category = layout.category.as_deref().unwrap_or("");

    score += match analysis.content_type {
        ContentType::DataVisualization if category == "data_visualization" => 3.0,
        ContentType::Narrative if category == "content" => 3.0,
        ContentType::Dashboard if category.contains("dashboard") => 3.0,
        _ => 0.0,
    };

    let structure = layout.structure.as_str();
    if analysis.structure == ContentStructure::Comparison && structure.contains("two_column") {
        score += 2.0;
    } else if analysis.structure == ContentStructure::SingleTopic
        && structure.contains("single_column")
    {
        score += 2.0;
    }

    let charts = layout.count_purpose(PurposeType::Chart);
    if analysis.has_charts {
        if charts > 0 {
            score += 2.0;
        }
        if analysis.data_points > 5 && charts >= 2 {
            score += 1.0;
        }
    } else if charts > 0 {
        score -= 1.0;
    }

    let text_slots = layout
        .placeholders
        .iter()
        .filter(|p| p.purpose.is_text())
        .count();
    match analysis.text_density {
        TextDensity::High if text_slots >= 2 => score += 1.0,
        TextDensity::Low if text_slots == 1 => score += 1.0,
        _ => {}
    }

    let wanted = analysis.content_type.as_str();
    if layout
        .use_cases
        .iter()
        .any(|case| case.replace(' ', "_") == wanted)
    {
        score += 1.0;
    }

    score
}

fn explain(analysis: &ContentAnalysis, layout: &LayoutDescriptor, score: f64) -> String {
    let content_type = analysis.content_type.as_str();
    let mut reasons = vec![if score >= 3.0 {
        format!("Perfect match for {}", content_type)
    } else if score >= 2.0 {
        format!("Good fit for {}", content_type)
    } else if score >= 1.0 {
        format!("Suitable for {}", content_type)
    } else {
        "Partial match".to_string()
    }];

    let charts = layout.count_purpose(PurposeType::Chart);
    if analysis.has_charts && charts > 0 {
        reasons.push(format!("Supports {} chart(s)", charts));
    }

    if analysis.structure == ContentStructure::Comparison
        && layout.structure.as_str().contains("two_column")
    {
        reasons.push("Ideal for comparisons".to_string());
    }

    format!("{}: {}", layout.semantic_name, reasons.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(fields: &[(&str, &str)]) -> ContentBag {
        let mut content = ContentBag::new();
        for (key, value) in fields {
            content.insert(*key, *value);
        }
        content
    }

    #[test]
    fn test_analyze_financial_content() {
        let mut content = bag(&[
            ("title", "Q3 Financial Results"),
            ("revenue_chart", "Revenue grew 15% to $45M"),
            ("cost_analysis", "Costs reduced by 8% through efficiency gains"),
        ]);
        content.insert(
            "metrics",
            vec!["revenue: $45M".to_string(), "growth: 15%".to_string(), "margin: 22%".to_string()],
        );

        let analysis = LayoutSelector::new().analyze(&content);
        assert!(analysis.has_charts);
        assert!(!analysis.has_tables);
        assert_eq!(analysis.content_type, ContentType::DataVisualization);
        assert_eq!(analysis.structure, ContentStructure::List);
        assert!(analysis.data_points > 5);
        assert!(analysis.key_metrics.contains(&"revenue".to_string()));
        assert!(analysis.key_metrics.contains(&"margin".to_string()));
    }

    #[test]
    fn test_analyze_comparison_keys() {
        let content = bag(&[("left", "Old way"), ("right", "New way")]);
        let analysis = LayoutSelector::new().analyze(&content);
        assert_eq!(analysis.structure, ContentStructure::Comparison);
        assert_eq!(analysis.content_type, ContentType::Comparison);
        assert_eq!(analysis.text_density, TextDensity::Low);
    }

    #[test]
    fn test_vs_needs_word_boundary() {
        let content = bag(&[("title", "Canvas painting")]);
        let analysis = LayoutSelector::new().analyze(&content);
        assert!(!analysis.has_tables);
        assert_eq!(analysis.structure, ContentStructure::SingleTopic);
    }

    #[test]
    fn test_analyze_narrative_density() {
        let long = "Residents enjoyed the garden program this spring. ".repeat(20);
        let content = bag(&[("summary", long.as_str())]);
        let analysis = LayoutSelector::new().analyze(&content);
        assert_eq!(analysis.text_density, TextDensity::High);
        assert_eq!(analysis.structure, ContentStructure::Narrative);
        assert_eq!(analysis.content_type, ContentType::Narrative);
    }

    #[test]
    fn test_recommend_chart_layout_for_data() {
        let registry = LayoutRegistry::builtin().unwrap();
        let mut content = bag(&[
            ("title", "Q3 Financial Results"),
            ("revenue_chart", "Revenue grew 15% to $45M"),
        ]);
        content.insert("metrics", vec!["growth: 15%".to_string(), "margin: 22%".to_string()]);

        let picks = LayoutSelector::new().recommend(&registry, &content, 3);
        assert_eq!(picks.len(), 3);
        let top = registry.get(picks[0].layout_id).unwrap();
        assert!(top.count_purpose(PurposeType::Chart) > 0);
        assert!(picks[0].reason.contains("chart(s)"));
        assert!(picks.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_recommend_two_column_for_comparison() {
        let registry = LayoutRegistry::builtin().unwrap();
        let content = bag(&[
            ("title", "Intake process"),
            ("before", "Five days per referral"),
            ("after", "Two days per referral"),
        ]);

        let picks = LayoutSelector::new().recommend(&registry, &content, 1);
        let top = registry.get(picks[0].layout_id).unwrap();
        assert!(top.structure.as_str().contains("two_column"));
        assert!(picks[0].reason.contains("Ideal for comparisons"));
    }

    #[test]
    fn test_recommend_top_n_larger_than_registry() {
        let registry = LayoutRegistry::builtin().unwrap();
        let picks = LayoutSelector::new().recommend(&registry, &bag(&[("title", "Hi")]), 100);
        assert_eq!(picks.len(), registry.len());
    }
}
