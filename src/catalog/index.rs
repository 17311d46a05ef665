use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{normalize_disease_name, normalize_symptom_name, CatalogError};

/// One `{id, name}` pair as exposed by the catalog listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: usize,
    pub name: String,
}

/// Symptom name → feature index, in training-table column order.
///
/// Indices are contiguous `0..len()` and names are unique. Lookups are
/// exact: no case folding, no fuzzy matching.
#[derive(Debug, Clone, Default)]
pub struct SymptomCatalog {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymptomCatalog {
    /// Build from raw column headers.
    ///
    /// Repeated raw headers are renamed `name.1`, `name.2`, ... so every
    /// column keeps its feature slot, then each header is normalized. Names
    /// that still collide after normalization are an error.
    pub fn from_headers<I, S>(headers: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for (position, raw) in dedup_headers(headers).into_iter().enumerate() {
            let name = normalize_symptom_name(&raw);
            if name.is_empty() {
                return Err(CatalogError::EmptySymptomName(position));
            }
            if catalog.index.contains_key(&name) {
                return Err(CatalogError::DuplicateSymptom(name));
            }
            catalog.index.insert(name.clone(), catalog.names.len());
            catalog.names.push(name);
        }
        Ok(catalog)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in ascending index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        to_entries(&self.names)
    }
}

/// Label index → disease name, in first-occurrence order of the outcome
/// column.
///
/// This must reproduce the label encoding the classifier was trained with.
#[derive(Debug, Clone, Default)]
pub struct DiseaseCatalog {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl DiseaseCatalog {
    /// Build from raw outcome values; repeated labels keep their first index.
    ///
    /// Distinctness is decided on the raw value, as the training encoder
    /// saw it. Two raw labels that trim to the same name would share one
    /// display key while owning two model indices, so that is an error.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        let mut raw_seen: HashMap<String, String> = HashMap::new();
        for raw in labels {
            let raw = raw.as_ref();
            if raw_seen.contains_key(raw) {
                continue;
            }
            let name = normalize_disease_name(raw);
            if name.is_empty() {
                continue;
            }
            if let Some(first) = raw_seen
                .iter()
                .find(|(_, seen)| **seen == name)
                .map(|(first, _)| first.clone())
            {
                return Err(CatalogError::AmbiguousDisease {
                    first,
                    second: raw.to_string(),
                });
            }
            raw_seen.insert(raw.to_string(), name.clone());
            catalog.index.insert(name.clone(), catalog.names.len());
            catalog.names.push(name);
        }
        Ok(catalog)
    }

    pub fn name(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        to_entries(&self.names)
    }
}

/// Rename repeated headers the way dataframe readers do: the first keeps
/// its name, later copies become `name.1`, `name.2`, skipping any suffix
/// already taken by another column.
fn dedup_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let headers: Vec<String> = headers.into_iter().map(|h| h.as_ref().to_string()).collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());

    for header in headers {
        if taken.insert(header.clone()) {
            out.push(header);
            continue;
        }
        let count = counts.entry(header.clone()).or_insert(0);
        let renamed = loop {
            *count += 1;
            let candidate = format!("{header}.{count}");
            if taken.insert(candidate.clone()) {
                break candidate;
            }
        };
        out.push(renamed);
    }
    out
}

fn to_entries(names: &[String]) -> Vec<CatalogEntry> {
    names
        .iter()
        .enumerate()
        .map(|(id, name)| CatalogEntry {
            id,
            name: name.clone(),
        })
        .collect()
}
