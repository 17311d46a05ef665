use std::collections::HashSet;

use super::PredictionError;
use crate::catalog::SymptomCatalog;

/// Fixed-length 0/1 indicator vector in symptom-catalog index order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn from_values(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Positions set to 1, ascending.
    pub fn active_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Encode a symptom set against `catalog`.
///
/// Order and duplicates in `symptoms` are irrelevant, and the empty set
/// encodes to the all-zero vector. If any name is not in the catalog the
/// whole request is rejected with every unknown name listed.
pub fn encode<S: AsRef<str>>(
    symptoms: &[S],
    catalog: &SymptomCatalog,
) -> Result<FeatureVector, PredictionError> {
    let mut seen = HashSet::new();
    let unknown: Vec<String> = symptoms
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !catalog.contains(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(PredictionError::InvalidSymptoms(unknown));
    }

    let mut values = vec![0.0f32; catalog.len()];
    for name in symptoms {
        if let Some(index) = catalog.index_of(name.as_ref()) {
            values[index] = 1.0;
        }
    }
    Ok(FeatureVector(values))
}

/// Names of the symptoms set in `features`, in catalog order.
pub fn decode<'c>(features: &FeatureVector, catalog: &'c SymptomCatalog) -> Vec<&'c str> {
    features
        .active_indices()
        .into_iter()
        .filter_map(|i| catalog.name(i))
        .collect()
}
