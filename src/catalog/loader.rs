use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use super::{CatalogError, DiseaseCatalog, ReferenceTables, SymptomCatalog};
use crate::config;

/// Name of the outcome column, which must be the last training column.
pub const OUTCOME_COLUMN: &str = "prognosis";

/// Everything loaded from the data directory at startup.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub symptoms: SymptomCatalog,
    pub diseases: DiseaseCatalog,
    pub tables: ReferenceTables,
}

/// Load the training catalogs and every reference table from `data_dir`.
///
/// Fails on the first missing file, unreadable file or missing column.
pub fn load(data_dir: &Path) -> Result<LoadedCatalog, CatalogError> {
    if !data_dir.is_dir() {
        return Err(CatalogError::MissingFile(data_dir.to_path_buf()));
    }
    tracing::info!(data_dir = %data_dir.display(), "Loading catalog data");

    let (symptoms, diseases) = load_training(&data_dir.join(config::TRAINING_FILE))?;
    tracing::info!(
        symptoms = symptoms.len(),
        diseases = diseases.len(),
        "Training catalogs built"
    );

    let mut tables = ReferenceTables::new();
    load_descriptions(&data_dir.join(config::DESCRIPTION_FILE), &mut tables)?;
    load_precautions(&data_dir.join(config::PRECAUTIONS_FILE), &mut tables)?;
    load_pairs(
        &data_dir.join(config::MEDICATIONS_FILE),
        "Medication",
        &mut tables,
        ReferenceTables::push_medication,
    )?;
    load_pairs(
        &data_dir.join(config::DIETS_FILE),
        "Diet",
        &mut tables,
        ReferenceTables::push_diet,
    )?;
    load_pairs(
        &data_dir.join(config::WORKOUTS_FILE),
        "workout",
        &mut tables,
        ReferenceTables::push_workout,
    )?;
    load_severities(&data_dir.join(config::SEVERITY_FILE), &mut tables)?;

    let counts = tables.counts();
    tracing::info!(
        descriptions = counts.descriptions,
        precautions = counts.precautions,
        medications = counts.medications,
        diets = counts.diets,
        workouts = counts.workouts,
        severities = counts.severities,
        "Reference tables loaded"
    );

    Ok(LoadedCatalog {
        symptoms,
        diseases,
        tables,
    })
}

/// Symptom catalog from the header, disease catalog from the outcome
/// column in first-occurrence order.
pub fn load_training(path: &Path) -> Result<(SymptomCatalog, DiseaseCatalog), CatalogError> {
    let mut table = CsvTable::open(path)?;

    let outcome = match table.headers.iter().last() {
        Some(last) if last.trim().eq_ignore_ascii_case(OUTCOME_COLUMN) => table.headers.len() - 1,
        _ => {
            return Err(CatalogError::MissingColumn {
                path: path.to_path_buf(),
                column: OUTCOME_COLUMN.to_string(),
            })
        }
    };
    if outcome == 0 {
        return Err(CatalogError::EmptyCatalog(format!(
            "{} has no symptom columns",
            path.display()
        )));
    }

    let symptoms = SymptomCatalog::from_headers(table.headers.iter().take(outcome))?;

    let mut labels = Vec::new();
    for (row, record) in table.records() {
        let record = record?;
        let label = record.get(outcome).unwrap_or("");
        if label.trim().is_empty() {
            return Err(CatalogError::InvalidValue {
                path: path.to_path_buf(),
                row,
                column: OUTCOME_COLUMN.to_string(),
                value: String::new(),
            });
        }
        labels.push(label.to_string());
    }

    let diseases = DiseaseCatalog::from_labels(&labels)?;
    if diseases.is_empty() {
        return Err(CatalogError::EmptyCatalog(format!(
            "{} has no outcome rows",
            path.display()
        )));
    }

    Ok((symptoms, diseases))
}

fn load_descriptions(path: &Path, tables: &mut ReferenceTables) -> Result<(), CatalogError> {
    let mut table = CsvTable::open(path)?;
    let disease = table.column("Disease")?;
    let description = table.column("Description")?;
    for (_, record) in table.records() {
        let record = record?;
        tables.insert_description(field(&record, disease), field(&record, description));
    }
    Ok(())
}

fn load_precautions(path: &Path, tables: &mut ReferenceTables) -> Result<(), CatalogError> {
    let mut table = CsvTable::open(path)?;
    let disease = table.column("Disease")?;
    let slots = [
        table.column("Precaution_1")?,
        table.column("Precaution_2")?,
        table.column("Precaution_3")?,
        table.column("Precaution_4")?,
    ];
    for (_, record) in table.records() {
        let record = record?;
        tables.insert_precautions(
            field(&record, disease),
            slots.iter().map(|&slot| record.get(slot)),
        );
    }
    Ok(())
}

/// Two-column `Disease` → value tables (medications, diets, workouts).
fn load_pairs(
    path: &Path,
    value_column: &str,
    tables: &mut ReferenceTables,
    push: fn(&mut ReferenceTables, &str, &str),
) -> Result<(), CatalogError> {
    let mut table = CsvTable::open(path)?;
    let disease = table.column("Disease")?;
    let value = table.column(value_column)?;
    for (_, record) in table.records() {
        let record = record?;
        push(tables, field(&record, disease), field(&record, value));
    }
    Ok(())
}

fn load_severities(path: &Path, tables: &mut ReferenceTables) -> Result<(), CatalogError> {
    let mut table = CsvTable::open(path)?;
    let symptom = table.column("Symptom")?;
    let weight = table.column("weight")?;
    let description = table.optional_column("description");
    for (row, record) in table.records() {
        let record = record?;
        let raw_weight = field(&record, weight).trim();
        let parsed = parse_weight(raw_weight).ok_or_else(|| CatalogError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: "weight".to_string(),
            value: raw_weight.to_string(),
        })?;
        let text = description.map(|c| field(&record, c)).unwrap_or("");
        tables.insert_severity(field(&record, symptom), parsed, text);
    }
    Ok(())
}

/// Integer weights; integral floats such as `3.0` are accepted.
fn parse_weight(raw: &str) -> Option<i64> {
    if let Ok(w) = raw.parse::<i64>() {
        return Some(w);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

fn field<'r>(record: &'r StringRecord, column: usize) -> &'r str {
    record.get(column).unwrap_or("")
}

/// An open CSV file with its header row resolved.
struct CsvTable {
    path: PathBuf,
    headers: StringRecord,
    reader: csv::Reader<std::fs::File>,
}

impl CsvTable {
    fn open(path: &Path) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::MissingFile(path.to_path_buf()));
        }
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|source| CatalogError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        let headers = reader
            .headers()
            .map_err(|source| CatalogError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            reader,
        })
    }

    /// Column lookup ignoring ASCII case, so `disease` and `Disease` match.
    fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn column(&self, name: &str) -> Result<usize, CatalogError> {
        self.optional_column(name)
            .ok_or_else(|| CatalogError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// Records paired with their 1-based data row number.
    fn records(
        &mut self,
    ) -> impl Iterator<Item = (usize, Result<StringRecord, CatalogError>)> + '_ {
        let path = self.path.clone();
        self.reader
            .records()
            .enumerate()
            .map(move |(i, record)| {
                let record = record.map_err(|source| CatalogError::Csv {
                    path: path.clone(),
                    source,
                });
                (i + 1, record)
            })
    }
}
