//! In-memory listing catalog loaded from JSON

use async_trait::async_trait;
use std::path::Path;

use sales_agent_core::{Catalog, CatalogItem, Error, FactType, Result, SearchFilters};

/// Catalog over a fixed list of items
///
/// Search preserves file order, so the first listed item ranks first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
}

impl InMemoryCatalog {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Parse a JSON array of items
    pub fn from_json_str(json: &str) -> Result<Self> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        Ok(Self::from_items(items))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Catalog(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), items = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find(&self, reference: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.is_named(reference))
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<CatalogItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| filters.matches(item))
            .cloned()
            .collect())
    }

    async fn lookup(
        &self,
        project: &str,
        fact: FactType,
    ) -> Result<Option<(CatalogItem, Option<String>)>> {
        Ok(self
            .find(project)
            .map(|item| (item.clone(), item.fact(fact))))
    }

    async fn reference_terms(&self) -> Result<Vec<String>> {
        let mut terms: Vec<String> = self
            .items
            .iter()
            .flat_map(|item| [&item.id, &item.name, &item.location])
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        terms.sort();
        terms.dedup();
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CATALOG: &str = r#"[
        {"id": "P1", "name": "Skyline Towers", "location": "Area X",
         "attributes": {"price_cr": 1.8, "configurations": ["2BHK", "3BHK"],
                        "registration_id": "RERA-001", "status": "Under construction"}},
        {"id": "P2", "name": "Green Meadows", "location": "Area X",
         "attributes": {"price_cr": 2.4, "configurations": ["3BHK"]}},
        {"id": "P3", "name": "Lake View", "location": "Area Y",
         "attributes": {"price_cr": 1.2, "configurations": "2BHK, 3BHK"}}
    ]"#;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_json_str(CATALOG).unwrap()
    }

    #[tokio::test]
    async fn test_search_applies_every_filter() {
        let filters = SearchFilters {
            configuration: Some("2BHK".into()),
            location: Some("Area X".into()),
            budget_max: Some(2.0),
            budget_min: None,
        };
        let results = catalog().search(&filters).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["P1"]);

        let all = catalog().search(&SearchFilters::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_lookup_by_name_or_id() {
        let (item, value) = catalog()
            .lookup("skyline towers", FactType::RegistrationId)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.id, "P1");
        assert_eq!(value.as_deref(), Some("RERA-001"));

        let (_, missing) = catalog()
            .lookup("P2", FactType::PossessionDate)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(missing, None);

        assert!(catalog().lookup("Nowhere", FactType::Price).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reference_terms() {
        let terms = catalog().reference_terms().await.unwrap();
        assert_eq!(
            terms,
            vec![
                "area x",
                "area y",
                "green meadows",
                "lake view",
                "p1",
                "p2",
                "p3",
                "skyline towers"
            ]
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = InMemoryCatalog::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, CATALOG.as_bytes()).unwrap();

        let catalog = InMemoryCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.items()[2].label(), "Lake View");
    }

    #[test]
    fn test_missing_file() {
        let err = InMemoryCatalog::load("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[test]
    fn test_from_items() {
        let catalog = InMemoryCatalog::from_items(vec![
            CatalogItem::new("P9", "Hill Crest", "Area Z").with_attribute("price_cr", json!(0.9)),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.items()[0].price_crores(), Some(0.9));
    }
}
