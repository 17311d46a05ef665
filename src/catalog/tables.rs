use std::collections::HashMap;

use serde::Serialize;

use super::{normalize_disease_name, normalize_symptom_name};

/// Number of precaution slots per disease row.
pub const PRECAUTION_SLOTS: usize = 4;

/// Severity entry for a single symptom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomSeverity {
    /// Normalized key as stored; the facade replaces it with the caller's
    /// query when answering a lookup.
    pub symptom: String,
    pub weight: i64,
    pub description: String,
}

/// Row counts per table, for startup logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub descriptions: usize,
    pub precautions: usize,
    pub medications: usize,
    pub diets: usize,
    pub workouts: usize,
    pub severities: usize,
}

/// Read-only reference data keyed by disease name (or symptom name for
/// severities).
///
/// Populated by the loader, never mutated after. Single-row tables
/// (descriptions, precautions, severities) keep the first matching row;
/// multi-row tables keep every row in file order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    descriptions: HashMap<String, String>,
    precautions: HashMap<String, Vec<String>>,
    medications: HashMap<String, Vec<String>>,
    diets: HashMap<String, Vec<String>>,
    workouts: HashMap<String, Vec<String>>,
    severities: HashMap<String, SymptomSeverity>,
    counts: TableCounts,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_description(&mut self, disease: &str, description: &str) {
        self.counts.descriptions += 1;
        self.descriptions
            .entry(normalize_disease_name(disease))
            .or_insert_with(|| description.to_string());
    }

    /// Slots are given in order 1 → 4; empty or blank slots are dropped.
    pub(crate) fn insert_precautions<'a, I>(&mut self, disease: &str, slots: I)
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        self.counts.precautions += 1;
        let key = normalize_disease_name(disease);
        if self.precautions.contains_key(&key) {
            return;
        }
        let kept: Vec<String> = slots
            .into_iter()
            .take(PRECAUTION_SLOTS)
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.precautions.insert(key, kept);
    }

    pub(crate) fn push_medication(&mut self, disease: &str, medication: &str) {
        self.counts.medications += 1;
        push_row(&mut self.medications, disease, medication);
    }

    pub(crate) fn push_diet(&mut self, disease: &str, diet: &str) {
        self.counts.diets += 1;
        push_row(&mut self.diets, disease, diet);
    }

    pub(crate) fn push_workout(&mut self, disease: &str, workout: &str) {
        self.counts.workouts += 1;
        push_row(&mut self.workouts, disease, workout);
    }

    pub(crate) fn insert_severity(&mut self, symptom: &str, weight: i64, description: &str) {
        self.counts.severities += 1;
        let key = normalize_symptom_name(symptom);
        self.severities
            .entry(key.clone())
            .or_insert_with(|| SymptomSeverity {
                symptom: key,
                weight,
                description: description.to_string(),
            });
    }

    pub fn description(&self, disease: &str) -> Option<&str> {
        self.descriptions
            .get(&normalize_disease_name(disease))
            .map(String::as_str)
    }

    pub fn precautions(&self, disease: &str) -> &[String] {
        rows(&self.precautions, disease)
    }

    pub fn medications(&self, disease: &str) -> &[String] {
        rows(&self.medications, disease)
    }

    pub fn diets(&self, disease: &str) -> &[String] {
        rows(&self.diets, disease)
    }

    pub fn workouts(&self, disease: &str) -> &[String] {
        rows(&self.workouts, disease)
    }

    /// Severity lookup; the query is normalized like the stored keys, so
    /// `skin_rash` and `skin rash` resolve to the same entry.
    pub fn severity(&self, symptom: &str) -> Option<&SymptomSeverity> {
        self.severities.get(&normalize_symptom_name(symptom))
    }

    pub fn counts(&self) -> TableCounts {
        self.counts
    }
}

fn push_row(table: &mut HashMap<String, Vec<String>>, disease: &str, value: &str) {
    table
        .entry(normalize_disease_name(disease))
        .or_default()
        .push(value.to_string());
}

fn rows<'a>(table: &'a HashMap<String, Vec<String>>, disease: &str) -> &'a [String] {
    table
        .get(&normalize_disease_name(disease))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
