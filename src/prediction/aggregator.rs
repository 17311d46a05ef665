use serde::{Deserialize, Serialize};

use crate::catalog::{normalize_disease_name, ReferenceTables};

/// Fallback description when the description table has no row.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Consolidated reference data for one disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub disease: String,
    pub description: String,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

/// Join the five disease-keyed tables for `disease`.
///
/// Never fails: a table without a matching row contributes its fallback
/// (`NO_DESCRIPTION` or an empty list).
pub fn lookup(tables: &ReferenceTables, disease: &str) -> DiseaseInfo {
    let disease = normalize_disease_name(disease);
    DiseaseInfo {
        description: tables
            .description(&disease)
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        precautions: tables.precautions(&disease).to_vec(),
        medications: tables.medications(&disease).to_vec(),
        diets: tables.diets(&disease).to_vec(),
        workouts: tables.workouts(&disease).to_vec(),
        disease,
    }
}
