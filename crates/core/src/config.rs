//! Planner configuration: default layout ids and the required-placeholder policy.

use crate::types::LayoutId;
use serde::{Deserialize, Serialize};

/// Layout ids used when a spec does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDefaults {
    /// Substituted for missing or unknown layout ids. Must exist in the registry.
    pub fallback: LayoutId,
    /// Title slides opened by `# ` and the generated title slide.
    pub title: LayoutId,
    /// Slides opened by `## ` or a bullet with no slide open.
    pub section: LayoutId,
    /// The generated body slide for free-text descriptions.
    pub body: LayoutId,
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            fallback: 0,
            title: 0,
            section: 5,
            body: 5,
        }
    }
}

impl LayoutDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, id: LayoutId) -> Self {
        self.fallback = id;
        self
    }

    pub fn with_title(mut self, id: LayoutId) -> Self {
        self.title = id;
        self
    }

    pub fn with_section(mut self, id: LayoutId) -> Self {
        self.section = id;
        self
    }

    pub fn with_body(mut self, id: LayoutId) -> Self {
        self.body = id;
        self
    }
}

/// What to do when a required placeholder receives no content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredPolicy {
    /// Emit the slide silently.
    #[default]
    Ignore,
    /// Emit the slide and report each empty required placeholder.
    Warn,
    /// Drop the slide and report why.
    Skip,
}

impl std::str::FromStr for RequiredPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown required policy '{}' (expected ignore, warn or skip)",
                other
            )),
        }
    }
}

/// Settings for a [`crate::Planner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub defaults: LayoutDefaults,
    pub required_policy: RequiredPolicy,
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: LayoutDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_required_policy(mut self, policy: RequiredPolicy) -> Self {
        self.required_policy = policy;
        self
    }
}
