//! Prediction service facade.
//!
//! `ModelService` is built once at startup and shared as `Arc<ModelService>`
//! by every request handler. All state inside is immutable after
//! construction, so no request-level locking is needed.
//!
//! Phases: `Uninitialized` (never loaded) and `Degraded` (loaded, but the
//! artifact does not match the catalogs) reject every operation with
//! `ServiceUnavailable`. Only `Ready` serves. There is no hot reload;
//! restarting the process is the recovery path.

use serde::{Deserialize, Serialize};

use super::{aggregator, encoder, DiseaseInfo, InferenceEngine, PredictionError};
use crate::catalog::{self, CatalogEntry, LoadedCatalog, SymptomSeverity};
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePhase {
    Uninitialized,
    Ready,
    Degraded,
}

/// Response of a successful prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    pub details: DiseaseInfo,
}

struct LoadedState {
    catalog: LoadedCatalog,
    engine: InferenceEngine,
}

enum State {
    Uninitialized,
    Ready(LoadedState),
    Degraded { reason: String },
}

pub struct ModelService {
    state: State,
}

impl ModelService {
    /// A service that rejects everything until replaced by a loaded one.
    pub fn uninitialized() -> Self {
        Self {
            state: State::Uninitialized,
        }
    }

    /// Load the artifact and every data file named by `settings`.
    ///
    /// A missing or malformed file is an error, never a partially loaded
    /// service. An artifact/catalog mismatch yields a `Degraded` service.
    pub fn load(settings: &Settings) -> Result<Self, PredictionError> {
        let engine = InferenceEngine::load(&settings.model_path)?;
        let catalog = catalog::load(&settings.data_dir)?;
        Ok(Self::from_parts(catalog, engine))
    }

    /// Assemble from already-loaded parts, running the integrity check.
    pub fn from_parts(catalog: LoadedCatalog, engine: InferenceEngine) -> Self {
        match check_integrity(&catalog, &engine) {
            Ok(()) => {
                tracing::info!(
                    symptoms = catalog.symptoms.len(),
                    diseases = catalog.diseases.len(),
                    model = engine.source(),
                    "Prediction service ready"
                );
                Self {
                    state: State::Ready(LoadedState { catalog, engine }),
                }
            }
            Err(reason) => {
                tracing::error!(%reason, model = engine.source(), "Prediction service degraded");
                Self {
                    state: State::Degraded { reason },
                }
            }
        }
    }

    pub fn phase(&self) -> ServicePhase {
        match self.state {
            State::Uninitialized => ServicePhase::Uninitialized,
            State::Ready(_) => ServicePhase::Ready,
            State::Degraded { .. } => ServicePhase::Degraded,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == ServicePhase::Ready
    }

    /// Why the service is not serving, if it isn't.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            State::Uninitialized => Some("service not initialized"),
            State::Ready(_) => None,
            State::Degraded { reason } => Some(reason),
        }
    }

    fn ready(&self) -> Result<&LoadedState, PredictionError> {
        match &self.state {
            State::Ready(loaded) => Ok(loaded),
            _ => Err(PredictionError::ServiceUnavailable(
                self.unavailable_reason()
                    .unwrap_or("service not ready")
                    .to_string(),
            )),
        }
    }

    /// Validate, encode, infer, resolve the label, enrich.
    pub fn predict_disease<S: AsRef<str>>(
        &self,
        symptoms: &[S],
    ) -> Result<PredictionResult, PredictionError> {
        let loaded = self.ready()?;
        let symptoms_catalog = &loaded.catalog.symptoms;
        let diseases = &loaded.catalog.diseases;

        let features = encoder::encode(symptoms, symptoms_catalog)?;
        if features.len() != symptoms_catalog.len() {
            return Err(PredictionError::DimensionMismatch {
                expected: symptoms_catalog.len(),
                actual: features.len(),
            });
        }

        let label = loaded.engine.predict(&features)?;
        let disease = diseases.name(label).ok_or_else(|| {
            tracing::error!(
                label,
                known = diseases.len(),
                model = loaded.engine.source(),
                "Model label missing from disease catalog; artifact and training data disagree"
            );
            PredictionError::UnknownLabel {
                label,
                known: diseases.len(),
            }
        })?;

        tracing::debug!(
            symptoms = features.active_indices().len(),
            label,
            disease,
            "Prediction complete"
        );

        Ok(PredictionResult {
            prediction: disease.to_string(),
            details: aggregator::lookup(&loaded.catalog.tables, disease),
        })
    }

    pub fn list_symptoms(&self) -> Result<Vec<CatalogEntry>, PredictionError> {
        Ok(self.ready()?.catalog.symptoms.entries())
    }

    pub fn list_diseases(&self) -> Result<Vec<CatalogEntry>, PredictionError> {
        Ok(self.ready()?.catalog.diseases.entries())
    }

    /// Reference data for `disease`; unknown names yield fallback values.
    pub fn disease_info(&self, disease: &str) -> Result<DiseaseInfo, PredictionError> {
        Ok(aggregator::lookup(&self.ready()?.catalog.tables, disease))
    }

    /// Severity entry for `symptom`, echoing the caller's spelling in the
    /// `symptom` field.
    pub fn symptom_severity(&self, symptom: &str) -> Result<SymptomSeverity, PredictionError> {
        self.ready()?
            .catalog
            .tables
            .severity(symptom)
            .map(|entry| SymptomSeverity {
                symptom: symptom.to_string(),
                ..entry.clone()
            })
            .ok_or_else(|| PredictionError::NotFound(format!("Symptom '{symptom}' not found")))
    }
}

/// Compare what the artifact declares against the loaded catalogs.
fn check_integrity(catalog: &LoadedCatalog, engine: &InferenceEngine) -> Result<(), String> {
    if let Some(dim) = engine.input_dim() {
        if dim != catalog.symptoms.len() {
            return Err(format!(
                "model expects {dim} features but the symptom catalog has {}",
                catalog.symptoms.len()
            ));
        }
    }
    if let Some(labels) = engine.label_count() {
        if labels != catalog.diseases.len() {
            return Err(format!(
                "model emits {labels} labels but the disease catalog has {}",
                catalog.diseases.len()
            ));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::test_support::*;
    use super::*;
    use crate::catalog::loader::fixtures;
    use crate::prediction::engine::stubs::StubClassifier;
    use crate::prediction::NO_DESCRIPTION;

    #[test]
    fn predicts_and_enriches_end_to_end() {
        let (_dir, service) = fixture_service(skin_rash_classifier());
        assert_eq!(service.phase(), ServicePhase::Ready);

        let result = service.predict_disease(&["skin rash"]).unwrap();
        assert_eq!(result.prediction, "Fungal infection");
        assert_eq!(result.details.disease, "Fungal infection");
        assert_eq!(result.details.description, "A fungal infection...");
        assert_eq!(
            result.details.precautions,
            vec![
                "bath twice",
                "use detol or neem in bathing water",
                "keep infected area dry",
                "use clean cloths"
            ]
        );
        assert_eq!(result.details.diets, vec!["Antifungal Diet", "Probiotics"]);
        assert_eq!(
            result.details.workouts,
            vec!["Avoid sugary foods", "Consume probiotics"]
        );
    }

    #[test]
    fn invalid_symptoms_skip_inference() {
        let stub = StubClassifier::constant(0);
        let calls = stub.calls();
        let (_dir, service) = fixture_service(stub);

        let err = service
            .predict_disease(&["fever", "itching", "cough"])
            .unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InvalidSymptoms(ref names) if names == &["fever", "cough"]
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        service.predict_disease(&["itching"]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn out_of_catalog_label_is_an_error() {
        let (_dir, service) = fixture_service(StubClassifier::constant(42));
        let err = service.predict_disease(&["itching"]).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::UnknownLabel { label: 42, known: 3 }
        ));
    }

    #[test]
    fn listings_are_contiguous_and_ordered() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0));

        let symptoms = service.list_symptoms().unwrap();
        let ids: Vec<usize> = symptoms.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(symptoms[2].name, "nodal skin eruptions");

        let diseases = service.list_diseases().unwrap();
        let names: Vec<&str> = diseases.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Allergy", "GERD", "Fungal infection"]);
        assert!(diseases.iter().enumerate().all(|(i, e)| e.id == i));
    }

    #[test]
    fn unknown_disease_info_is_structurally_valid() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0));
        let info = service.disease_info("Nonexistent disease").unwrap();
        assert_eq!(info.description, NO_DESCRIPTION);
        assert!(info.precautions.is_empty());
        assert!(info.medications.is_empty());
        assert!(info.diets.is_empty());
        assert!(info.workouts.is_empty());
    }

    #[test]
    fn severity_lookup_hits_and_misses() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0));

        let hit = service.symptom_severity("skin rash").unwrap();
        assert_eq!(hit.weight, 3);
        assert_eq!(hit.description, "Red patches on the skin");

        let miss = service.symptom_severity("fever").unwrap_err();
        assert!(matches!(miss, PredictionError::NotFound(_)));
    }

    #[test]
    fn severity_echoes_query_spelling() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0));
        let hit = service.symptom_severity("skin_rash").unwrap();
        assert_eq!(hit.symptom, "skin_rash");
        assert_eq!(hit.weight, 3);
    }

    #[test]
    fn empty_symptom_set_classifies_zero_vector() {
        let stub = StubClassifier::from_fn(|features| {
            if features.active_indices().is_empty() {
                1
            } else {
                0
            }
        });
        let (_dir, service) = fixture_service(stub);
        let empty: [&str; 0] = [];
        assert_eq!(service.predict_disease(&empty).unwrap().prediction, "GERD");
    }

    #[test]
    fn concurrent_predictions_agree() {
        let (_dir, service) = fixture_service(skin_rash_classifier());
        let service = Arc::new(service);

        let results: Vec<(String, String)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let service = Arc::clone(&service);
                    scope.spawn(move || {
                        let symptoms = if i % 2 == 0 { "skin rash" } else { "itching" };
                        let mut last = String::new();
                        for _ in 0..50 {
                            last = service.predict_disease(&[symptoms]).unwrap().prediction;
                        }
                        (symptoms.to_string(), last)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.len(), 8);
        for (symptom, prediction) in results {
            let expected = if symptom == "skin rash" {
                "Fungal infection"
            } else {
                "Allergy"
            };
            assert_eq!(prediction, expected);
        }
    }

    #[test]
    fn uninitialized_service_rejects_everything() {
        let service = ModelService::uninitialized();
        assert_eq!(service.phase(), ServicePhase::Uninitialized);
        assert!(matches!(
            service.predict_disease(&["itching"]),
            Err(PredictionError::ServiceUnavailable(_))
        ));
        assert!(matches!(
            service.list_symptoms(),
            Err(PredictionError::ServiceUnavailable(_))
        ));
        assert!(matches!(
            service.disease_info("Allergy"),
            Err(PredictionError::ServiceUnavailable(_))
        ));
        assert!(matches!(
            service.symptom_severity("itching"),
            Err(PredictionError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn mismatched_artifact_degrades_service() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0).with_dims(132, 41));
        assert_eq!(service.phase(), ServicePhase::Degraded);
        assert!(service
            .unavailable_reason()
            .unwrap()
            .contains("132 features"));
        assert!(matches!(
            service.list_diseases(),
            Err(PredictionError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn label_count_mismatch_degrades_service() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0).with_dims(3, 5));
        assert_eq!(service.phase(), ServicePhase::Degraded);
    }

    #[test]
    fn matching_dimensions_are_ready() {
        let (_dir, service) = fixture_service(StubClassifier::constant(0).with_dims(3, 3));
        assert!(service.is_ready());
    }

    #[test]
    fn missing_reference_file_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        fixtures::write_data_dir(&settings.data_dir);
        std::fs::create_dir_all(settings.model_path.parent().unwrap()).unwrap();
        std::fs::write(
            &settings.model_path,
            r#"{"strategy":"one_vs_rest","n_features":3,"classes":[0,1,2],
                "coefficients":[[1,0,0],[0,0,1],[0,1,0]],"intercepts":[0,0,0]}"#,
        )
        .unwrap();

        assert!(ModelService::load(&settings).unwrap().is_ready());

        std::fs::remove_file(settings.data_file(crate::config::WORKOUTS_FILE)).unwrap();
        let err = ModelService::load(&settings).err().unwrap();
        assert!(matches!(err, PredictionError::DataLoad(_)));
    }

    #[test]
    fn missing_model_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        fixtures::write_data_dir(&settings.data_dir);
        let err = ModelService::load(&settings).err().unwrap();
        assert!(matches!(err, PredictionError::ModelUnavailable(_)));
    }

    #[test]
    fn loaded_linear_model_predicts_fixture_rows() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        fixtures::write_data_dir(&settings.data_dir);
        std::fs::create_dir_all(settings.model_path.parent().unwrap()).unwrap();
        // Feature i votes for label: itching → Allergy, nodal → GERD,
        // skin rash → Fungal infection.
        std::fs::write(
            &settings.model_path,
            r#"{"strategy":"one_vs_rest","n_features":3,"classes":[0,1,2],
                "coefficients":[[1,0,0],[0,0,1],[0,1,0]],"intercepts":[0,0,0]}"#,
        )
        .unwrap();

        let service = ModelService::load(&settings).unwrap();
        assert_eq!(
            service.predict_disease(&["skin rash"]).unwrap().prediction,
            "Fungal infection"
        );
        assert_eq!(
            service
                .predict_disease(&["nodal skin eruptions"])
                .unwrap()
                .prediction,
            "GERD"
        );
    }
}
