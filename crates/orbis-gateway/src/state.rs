use std::sync::Arc;

use orbis_catalog::CountryCatalog;

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<dyn CountryCatalog>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CountryCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &dyn CountryCatalog {
        self.catalog.as_ref()
    }
}
