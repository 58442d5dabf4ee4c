//! crates/go_tany_core/src/filter.rs
//!
//! Free-text, plant and disease-type filtering over a catalog.

use serde::{Deserialize, Serialize};

use crate::domain::DiseaseRecord;

/// Plant filter value meaning "every plant".
pub const ALL_PLANTS: &str = "Semua Buah";

/// The criteria of one catalog view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub search_term: String,
    pub plant_filter: String,
    pub disease_filter: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            plant_filter: ALL_PLANTS.to_string(),
            disease_filter: String::new(),
        }
    }
}

impl FilterCriteria {
    pub fn matches(&self, record: &DiseaseRecord) -> bool {
        matches_search(record, &self.search_term)
            && matches_plant(record, &self.plant_filter)
            && matches_disease(record, &self.disease_filter)
    }
}

/// Case-insensitive substring match on title, plant or type. An empty term matches.
pub fn matches_search(record: &DiseaseRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    record.title.to_lowercase().contains(&term)
        || record.plant.to_lowercase().contains(&term)
        || record.disease_type.to_lowercase().contains(&term)
}

fn matches_plant(record: &DiseaseRecord, plant_filter: &str) -> bool {
    plant_filter.is_empty()
        || plant_filter == ALL_PLANTS
        || record.plant.to_lowercase() == plant_filter.to_lowercase()
}

fn matches_disease(record: &DiseaseRecord, disease_filter: &str) -> bool {
    disease_filter.is_empty() || record.disease_type.to_lowercase() == disease_filter.to_lowercase()
}

/// Keeps the records matching every criterion, in catalog order.
pub fn filter<'a>(catalog: &'a [DiseaseRecord], criteria: &FilterCriteria) -> Vec<&'a DiseaseRecord> {
    catalog.iter().filter(|record| criteria.matches(record)).collect()
}

/// Distinct plants in order of first appearance, for the plant dropdown.
pub fn plant_options(catalog: &[DiseaseRecord]) -> Vec<String> {
    distinct(catalog.iter().map(|d| d.plant.as_str()))
}

/// Distinct disease types in order of first appearance.
pub fn disease_type_options(catalog: &[DiseaseRecord]) -> Vec<String> {
    distinct(catalog.iter().map(|d| d.disease_type.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

/// A catalog view: current criteria plus the memoized result for them.
///
/// `last_results` is `None` until the view has been filtered at least once for the
/// current criteria, which keeps "not yet filtered" apart from an empty result.
#[derive(Debug, Clone)]
pub struct CatalogView<'a> {
    catalog: &'a [DiseaseRecord],
    criteria: FilterCriteria,
    results: Option<Vec<&'a DiseaseRecord>>,
}

impl<'a> CatalogView<'a> {
    pub fn new(catalog: &'a [DiseaseRecord]) -> Self {
        Self::with_criteria(catalog, FilterCriteria::default())
    }

    pub fn with_criteria(catalog: &'a [DiseaseRecord], criteria: FilterCriteria) -> Self {
        Self {
            catalog,
            criteria,
            results: None,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria != self.criteria {
            self.criteria = criteria;
            self.results = None;
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        let criteria = FilterCriteria {
            search_term: term.into(),
            ..self.criteria.clone()
        };
        self.set_criteria(criteria);
    }

    pub fn set_plant_filter(&mut self, plant: impl Into<String>) {
        let criteria = FilterCriteria {
            plant_filter: plant.into(),
            ..self.criteria.clone()
        };
        self.set_criteria(criteria);
    }

    pub fn set_disease_filter(&mut self, disease: impl Into<String>) {
        let criteria = FilterCriteria {
            disease_filter: disease.into(),
            ..self.criteria.clone()
        };
        self.set_criteria(criteria);
    }

    /// Back to the default criteria.
    pub fn reset(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    /// Filters if the criteria changed since the last call, then returns the result.
    pub fn results(&mut self) -> &[&'a DiseaseRecord] {
        let catalog = self.catalog;
        let criteria = &self.criteria;
        self.results.get_or_insert_with(|| filter(catalog, criteria))
    }

    pub fn last_results(&self) -> Option<&[&'a DiseaseRecord]> {
        self.results.as_deref()
    }
}
