//! The doctor dashboard: profile, own patients and mapping statistics.

use crate::api::SharedApi;
use crate::documents::SharedDocumentStore;
use crate::{TerminologyError, TerminologyResult};
use ayush_types::{Doctor, MappingStats, Patient};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub doctor: Option<Doctor>,
    pub patients: Vec<Patient>,
    pub stats: MappingStats,
}

/// Randomized stand-in statistics shown when the stats endpoint is unreachable.
///
/// The per-system counts never exceed the total, and the result is flagged as a
/// placeholder so callers can label it.
pub fn placeholder_stats<R: Rng>(rng: &mut R) -> MappingStats {
    let ayurveda_mappings = rng.gen_range(100..500);
    let siddha_mappings = rng.gen_range(50..300);
    let unani_mappings = rng.gen_range(50..300);
    let total_mappings = ayurveda_mappings + siddha_mappings + unani_mappings;

    MappingStats {
        total_mappings,
        ayurveda_mappings,
        siddha_mappings,
        unani_mappings,
        average_confidence: rng.gen_range(0.6..0.95),
        high_confidence_mappings: rng.gen_range(0..=total_mappings / 2),
        placeholder: true,
    }
}

fn random_placeholder_stats() -> MappingStats {
    placeholder_stats(&mut rand::thread_rng())
}

#[derive(Clone)]
pub struct DashboardReader {
    api: SharedApi,
    store: SharedDocumentStore,
}

impl DashboardReader {
    pub fn new(api: SharedApi, store: SharedDocumentStore) -> Self {
        Self { api, store }
    }

    async fn doctor(&self, uid: &str) -> Option<Doctor> {
        match self.store.doctor(uid).await {
            Ok(doctor) => doctor,
            Err(e) => {
                tracing::warn!("failed to read profile of {}: {}", uid, e);
                None
            }
        }
    }

    async fn patients(&self, uid: &str) -> Vec<Patient> {
        match self.store.patients_created_by(uid).await {
            Ok(patients) => patients,
            Err(e) => {
                tracing::warn!("failed to read patients of {}: {}", uid, e);
                Vec::new()
            }
        }
    }

    /// Mapping statistics, or flagged placeholders when the endpoint fails.
    pub async fn stats(&self) -> MappingStats {
        match self.api.mapping_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("mapping stats unavailable, using placeholders: {}", e);
                random_placeholder_stats()
            }
        }
    }

    /// Load the dashboard of doctor `uid`. Profile, patients and stats are fetched
    /// concurrently and each falls back independently.
    ///
    /// # Errors
    ///
    /// Only a blank `uid` is an error.
    pub async fn load(&self, uid: &str) -> TerminologyResult<Dashboard> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(TerminologyError::InvalidInput("doctor uid cannot be empty".into()));
        }
        let (doctor, patients, stats) =
            tokio::join!(self.doctor(uid), self.patients(uid), self.stats());

        tracing::debug!("dashboard for {}: {} patients", uid, patients.len());
        Ok(Dashboard {
            doctor,
            patients,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryDocumentStore, MockTerminologyApi};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn doctor() -> Doctor {
        Doctor {
            uid: "doc-1".into(),
            display_name: Some("Dr. Meera Nair".into()),
            ..Default::default()
        }
    }

    fn patient(id: &str, created_by: &str) -> Patient {
        Patient {
            id: id.into(),
            name: format!("Patient {id}"),
            created_by: created_by.into(),
            ..Default::default()
        }
    }

    fn reader(api: MockTerminologyApi, store: MemoryDocumentStore) -> DashboardReader {
        DashboardReader::new(Arc::new(api), Arc::new(store))
    }

    #[test]
    fn placeholder_stats_are_flagged_and_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let stats = placeholder_stats(&mut rng);
            assert!(stats.placeholder);
            assert_eq!(
                stats.total_mappings,
                stats.ayurveda_mappings + stats.siddha_mappings + stats.unani_mappings
            );
            assert!(stats.high_confidence_mappings <= stats.total_mappings);
            assert!((0.6..0.95).contains(&stats.average_confidence));
        }
    }

    #[tokio::test]
    async fn loads_profile_own_patients_and_stats() {
        let stats = MappingStats {
            total_mappings: 42,
            ..Default::default()
        };
        let store = MemoryDocumentStore::new()
            .with_doctor(doctor())
            .with_patient(patient("p1", "doc-1"))
            .with_patient(patient("p2", "doc-2"));
        let dashboard = reader(MockTerminologyApi::new().with_stats(stats), store)
            .load("doc-1")
            .await
            .unwrap();

        assert_eq!(
            dashboard.doctor.unwrap().display_name.as_deref(),
            Some("Dr. Meera Nair")
        );
        assert_eq!(dashboard.patients.len(), 1);
        assert_eq!(dashboard.patients[0].id, "p1");
        assert_eq!(dashboard.stats.total_mappings, 42);
        assert!(!dashboard.stats.placeholder);
    }

    #[tokio::test]
    async fn failures_fall_back_independently() {
        let dashboard = reader(
            MockTerminologyApi::new().failing_stats(),
            MemoryDocumentStore::new().with_doctor(doctor()).unavailable(),
        )
        .load("doc-1")
        .await
        .unwrap();

        assert!(dashboard.doctor.is_none());
        assert!(dashboard.patients.is_empty());
        assert!(dashboard.stats.placeholder);
    }

    #[tokio::test]
    async fn blank_uid_is_rejected() {
        let result = reader(MockTerminologyApi::new(), MemoryDocumentStore::new())
            .load(" ")
            .await;
        assert!(matches!(result, Err(TerminologyError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn uid_is_trimmed_before_lookup() {
        let store = MemoryDocumentStore::new()
            .with_doctor(doctor())
            .with_patient(patient("p1", "doc-1"));
        let dashboard = reader(MockTerminologyApi::new(), store)
            .load(" doc-1 ")
            .await
            .unwrap();
        assert!(dashboard.doctor.is_some());
        assert_eq!(dashboard.patients.len(), 1);
    }
}
