//! Catalog interface

use crate::catalog::{CatalogItem, FactType, SearchFilters};
use crate::Result;
use async_trait::async_trait;

/// Structured listing store
#[async_trait]
pub trait Catalog: Send + Sync + 'static {
    /// Items matching every filter present, best match first
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<CatalogItem>>;

    /// Resolve a project reference (id or name) and read one fact
    ///
    /// Returns `Ok(None)` when the project is unknown.
    async fn lookup(&self, project: &str, fact: FactType)
        -> Result<Option<(CatalogItem, Option<String>)>>;

    /// Ids, names and locations a user may refer to directly
    ///
    /// Lets enrichment leave utterances that already name an item alone.
    /// The default knows nothing.
    async fn reference_terms(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
