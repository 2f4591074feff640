//! Filter catalog: the registry of available filter kinds.

use crate::core::error::CatalogError;
use crate::core::instance::FilterInstance;
use crate::core::kind::{Category, FilterKind};
use indexmap::IndexMap;
use std::sync::Arc;

/// Label used for a kind the catalog does not know.
pub const UNKNOWN_FILTER: &str = "Unknown Filter";

/// One row of the flat catalog listing.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    /// Start of a category group.
    CategoryHeader(Category),
    /// A filter kind within the preceding category.
    FilterRef(Arc<FilterKind>),
}

impl CatalogEntry {
    /// Identifier text: the category label or the kind id.
    pub fn label(&self) -> &str {
        match self {
            CatalogEntry::CategoryHeader(category) => category.display_name(),
            CatalogEntry::FilterRef(kind) => &kind.id,
        }
    }

    /// Human-readable text for display.
    pub fn display_name(&self) -> &str {
        match self {
            CatalogEntry::CategoryHeader(category) => category.display_name(),
            CatalogEntry::FilterRef(kind) => &kind.name,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, CatalogEntry::CategoryHeader(_))
    }

    /// The kind, if this entry is a filter.
    pub fn kind(&self) -> Option<&Arc<FilterKind>> {
        match self {
            CatalogEntry::FilterRef(kind) => Some(kind),
            CatalogEntry::CategoryHeader(_) => None,
        }
    }
}

/// Registry of every filter kind known to the process.
///
/// Populated once at startup and read-only afterwards.
pub struct FilterCatalog {
    /// Kinds indexed by their unique ID.
    kinds: IndexMap<String, Arc<FilterKind>>,
    /// Kind IDs grouped by category, in registration order.
    categories: IndexMap<Category, Vec<String>>,
}

impl FilterCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            kinds: IndexMap::new(),
            categories: IndexMap::new(),
        }
    }

    /// Create a catalog pre-populated with the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::filters::builtin::register_all(&mut catalog);
        catalog
    }

    /// Register a kind, replacing any kind with the same ID.
    pub fn register(&mut self, kind: FilterKind) -> Arc<FilterKind> {
        let id = kind.id.clone();
        let category = kind.category;
        let kind = Arc::new(kind);

        if let Some(previous) = self.kinds.insert(id.clone(), Arc::clone(&kind)) {
            if let Some(ids) = self.categories.get_mut(&previous.category) {
                ids.retain(|i| *i != id);
            }
        }

        self.categories.entry(category).or_default().push(id);
        kind
    }

    /// Remove a kind. Returns false if it was not registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        if let Some(kind) = self.kinds.shift_remove(id) {
            if let Some(ids) = self.categories.get_mut(&kind.category) {
                ids.retain(|i| i != id);
            }
            true
        } else {
            false
        }
    }

    /// Check if a kind is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.kinds.contains_key(id)
    }

    /// Get a kind without failing.
    pub fn get(&self, id: &str) -> Option<&Arc<FilterKind>> {
        self.kinds.get(id)
    }

    /// Metadata and ordered parameters of a kind.
    pub fn describe(&self, id: &str) -> Result<&Arc<FilterKind>, CatalogError> {
        self.kinds
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Create a fresh instance of a kind with default values.
    pub fn create_instance(&self, id: &str) -> Result<FilterInstance, CatalogError> {
        self.describe(id).map(|kind| FilterInstance::create(Arc::clone(kind)))
    }

    /// Display name of a kind, or a placeholder for unknown IDs.
    pub fn display_name(&self, id: &str) -> &str {
        self.kinds
            .get(id)
            .map(|k| k.name.as_str())
            .unwrap_or(UNKNOWN_FILTER)
    }

    /// Flat listing: each non-empty category header followed by its kinds,
    /// categories in their fixed order.
    pub fn list_available(&self) -> Vec<CatalogEntry> {
        let mut entries = Vec::with_capacity(self.kinds.len() + self.categories.len());

        for category in Category::all() {
            let ids = match self.categories.get(category) {
                Some(ids) if !ids.is_empty() => ids,
                _ => continue,
            };

            entries.push(CatalogEntry::CategoryHeader(*category));
            entries.extend(
                ids.iter()
                    .filter_map(|id| self.kinds.get(id))
                    .map(|kind| CatalogEntry::FilterRef(Arc::clone(kind))),
            );
        }

        entries
    }

    /// Get kind IDs in a category.
    pub fn filters_by_category(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|ids| ids.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Search kinds by ID, name or description.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.kinds
            .values()
            .filter(|kind| {
                kind.id.to_lowercase().contains(&query)
                    || kind.name.to_lowercase().contains(&query)
                    || kind.description.to_lowercase().contains(&query)
            })
            .map(|kind| kind.id.as_str())
            .collect()
    }

    /// Get all registered kind IDs in registration order.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(|s| s.as_str())
    }

    /// Get the total number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameter::ParameterSpec;
    use crate::core::types::{ParameterType, Value};

    fn kind(id: &str, category: Category) -> FilterKind {
        FilterKind::builder(id, format!("{} Filter", id))
            .category(category)
            .description(format!("Applies {}", id))
            .parameter(ParameterSpec::new("amount", ParameterType::Scalar, Value::Number(1.0)))
            .build()
    }

    #[test]
    fn test_empty_catalog_lists_nothing() {
        assert!(FilterCatalog::new().list_available().is_empty());
    }

    #[test]
    fn test_single_blur_listing() {
        let mut catalog = FilterCatalog::new();
        catalog.register(kind("GaussianBlur", Category::Blur));

        let entries = catalog.list_available();
        let labels: Vec<_> = entries.iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["Blur", "GaussianBlur"]);
        assert_eq!(entries[0], CatalogEntry::CategoryHeader(Category::Blur));
        assert!(entries[0].is_header());
        assert_eq!(entries[1].kind().unwrap().id, "GaussianBlur");
    }

    #[test]
    fn test_listing_follows_category_order() {
        let mut catalog = FilterCatalog::new();
        catalog.register(kind("Edges", Category::Stylize));
        catalog.register(kind("BoxBlur", Category::Blur));
        catalog.register(kind("Invert", Category::ColorEffect));
        catalog.register(kind("GaussianBlur", Category::Blur));

        let labels: Vec<_> = catalog
            .list_available()
            .iter()
            .map(|e| e.label().to_string())
            .collect();
        assert_eq!(
            labels,
            vec!["Blur", "BoxBlur", "GaussianBlur", "Color Effect", "Invert", "Stylize", "Edges"]
        );
    }

    #[test]
    fn test_describe_unknown_kind() {
        let catalog = FilterCatalog::new();
        assert_eq!(
            catalog.describe("Nope").unwrap_err(),
            CatalogError::NotFound("Nope".to_string())
        );
        assert!(catalog.create_instance("Nope").is_err());
        assert_eq!(catalog.display_name("Nope"), UNKNOWN_FILTER);
    }

    #[test]
    fn test_reregister_moves_category() {
        let mut catalog = FilterCatalog::new();
        catalog.register(kind("Sharpen", Category::Blur));
        catalog.register(kind("Sharpen", Category::Sharpen));

        assert_eq!(catalog.len(), 1);
        assert!(catalog.filters_by_category(Category::Blur).is_empty());
        assert_eq!(catalog.filters_by_category(Category::Sharpen), vec!["Sharpen"]);
    }

    #[test]
    fn test_search_and_unregister() {
        let mut catalog = FilterCatalog::new();
        catalog.register(kind("GaussianBlur", Category::Blur));
        catalog.register(kind("Edges", Category::Stylize));

        assert_eq!(catalog.search("gauss"), vec!["GaussianBlur"]);
        assert_eq!(catalog.search("applies").len(), 2);
        assert!(catalog.unregister("Edges"));
        assert!(!catalog.contains("Edges"));
        assert!(!catalog.unregister("Edges"));
    }

    #[test]
    fn test_create_instance_seeds_defaults() {
        let mut catalog = FilterCatalog::new();
        catalog.register(kind("GaussianBlur", Category::Blur));
        let instance = catalog.create_instance("GaussianBlur").unwrap();
        assert_eq!(instance.parameter_value("amount"), Some(&Value::Number(1.0)));
    }
}
