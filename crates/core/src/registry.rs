//! Read-only catalog of slide layouts.
//!
//! The registry is built once (from the embedded catalog, a JSON file or an
//! inspected template) and then only read. It holds no interior mutability,
//! so one instance can back any number of concurrent planners.

use crate::error::{Error, Result};
use crate::types::{match_key, LayoutDescriptor, LayoutId, PlaceholderSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Catalog bundled with the crate: 22 corporate layouts, ids 0 through 21.
const BUILTIN_CATALOG: &str = include_str!("../data/layouts.json");

/// On-disk catalog shape: either `{"layouts": [...]}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { layouts: Vec<LayoutDescriptor> },
    Bare(Vec<LayoutDescriptor>),
}

#[derive(Serialize)]
struct CatalogOut<'a> {
    layouts: &'a [LayoutDescriptor],
}

/// Layout descriptors keyed by id, kept in insertion order.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: Vec<LayoutDescriptor>,
    positions: HashMap<LayoutId, usize>,
}

impl LayoutRegistry {
    /// Build a registry from descriptors.
    ///
    /// Placeholder sibling indices are recomputed from declaration order.
    /// Duplicate layout ids are a configuration error.
    pub fn new(layouts: Vec<LayoutDescriptor>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(layouts.len());
        let mut layouts = layouts;

        for (pos, layout) in layouts.iter_mut().enumerate() {
            if positions.insert(layout.id, pos).is_some() {
                return Err(Error::Configuration(format!(
                    "duplicate layout id {} in catalog",
                    layout.id
                )));
            }
            layout.assign_sibling_indices();
        }

        log::debug!("Layout registry loaded with {} layouts", layouts.len());

        Ok(Self { layouts, positions })
    }

    /// The catalog embedded in this crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Parse a JSON catalog.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: CatalogFile =
            serde_json::from_str(json).map_err(|e| Error::CatalogError(e.to_string()))?;
        Self::from_catalog(catalog)
    }

    /// Read a JSON catalog from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let catalog: CatalogFile =
            serde_json::from_reader(reader).map_err(|e| Error::CatalogError(e.to_string()))?;
        Self::from_catalog(catalog)
    }

    /// Read a JSON catalog file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_catalog(catalog: CatalogFile) -> Result<Self> {
        match catalog {
            CatalogFile::Wrapped { layouts } | CatalogFile::Bare(layouts) => Self::new(layouts),
        }
    }

    /// Fetch a layout by id.
    pub fn get(&self, id: LayoutId) -> Result<&LayoutDescriptor> {
        self.positions
            .get(&id)
            .map(|&pos| &self.layouts[pos])
            .ok_or(Error::LayoutNotFound(id))
    }

    pub fn contains(&self, id: LayoutId) -> bool {
        self.positions.contains_key(&id)
    }

    /// All layouts in insertion order.
    pub fn all(&self) -> &[LayoutDescriptor] {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Find layouts matching any of the requested features.
    ///
    /// A feature matches when it is a case-insensitive substring of the
    /// layout's semantic name, its structure tag, or any placeholder purpose.
    /// An empty feature list returns every layout.
    pub fn query<S: AsRef<str>>(&self, features: &[S]) -> Vec<&LayoutDescriptor> {
        if features.is_empty() {
            return self.layouts.iter().collect();
        }

        let keys: Vec<String> = features.iter().map(|f| match_key(f.as_ref())).collect();

        self.layouts
            .iter()
            .filter(|layout| keys.iter().any(|key| layout_matches(layout, key)))
            .collect()
    }

    /// Placeholder counts for one layout.
    pub fn summary(&self, id: LayoutId) -> Result<PlaceholderSummary> {
        self.get(id).map(LayoutDescriptor::summary)
    }

    /// Serialize the catalog in the `{"layouts": [...]}` file shape.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&CatalogOut {
            layouts: &self.layouts,
        })
        .map_err(|e| Error::CatalogError(e.to_string()))
    }
}

fn layout_matches(layout: &LayoutDescriptor, key: &str) -> bool {
    match_key(&layout.semantic_name).contains(key)
        || layout.structure.as_str().contains(key)
        || layout
            .placeholders
            .iter()
            .any(|p| p.purpose.as_str().contains(key))
}
