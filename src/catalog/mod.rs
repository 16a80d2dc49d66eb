pub mod form;
pub mod images;
pub mod normalize;

pub use form::{FormError, FormField, SpecimenDraft};
pub use normalize::{normalize_catalog, normalize_catalog_at};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, CrabApi};
use crate::quiz::AnswerVector;

/// A species record as the catalog screen shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub nombre: String,
    pub nombre_cientifico: String,
    pub habitat: String,
    pub tamano: String,
    pub descripcion: String,
    pub imagen: Option<String>,
    pub fecha_agregada: DateTime<Utc>,
    #[serde(rename = "preguntas_identificacion")]
    pub preguntas_identificacion: AnswerVector,
}

impl CatalogEntry {
    /// Case-insensitive match on common name, scientific name or habitat.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || [&self.nombre, &self.nombre_cientifico, &self.habitat]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Payload of an insertion. The service assigns id and date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpecimen {
    pub nombre: String,
    pub nombre_cientifico: String,
    pub habitat: String,
    pub tamano: String,
    pub descripcion: String,
    pub imagen: String,
    #[serde(rename = "preguntas_identificacion")]
    pub preguntas_identificacion: AnswerVector,
}

/// The chat's local view of the remote catalog.
///
/// Every mutation goes through the service first. When a call fails the
/// view is left exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn search(&self, term: &str) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|entry| entry.matches(term)).collect()
    }

    /// Drops the entry with `id`. Unknown ids leave the view untouched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Replaces the view with a freshly normalized copy of the remote catalog.
    pub async fn refresh(&mut self, api: &CrabApi) -> Result<(), ApiError> {
        let raw = api.fetch_catalog().await?;
        self.entries = normalize_catalog(&raw);
        Ok(())
    }

    /// Stores a specimen, then re-fetches so the view carries the id and date
    /// the service assigned.
    pub async fn add(&mut self, api: &CrabApi, specimen: &NewSpecimen) -> Result<(), ApiError> {
        api.save_specimen(specimen).await?;
        self.refresh(api).await
    }

    /// Deletes remotely, then patches the view. Returns whether a local entry
    /// was removed.
    pub async fn delete(&mut self, api: &CrabApi, id: &str) -> Result<bool, ApiError> {
        api.delete_specimen(id).await?;
        Ok(self.remove(id))
    }
}
