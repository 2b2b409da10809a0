//! Doctor and patient documents.
//!
//! The document store is external and read-only from this crate's point of view. Two
//! collections are consumed:
//!
//! ```text
//! users/
//!   <uid>.json          # doctor profile
//! patients/
//!   <id>.json           # patient record, `createdBy` holds the doctor uid
//! ```
//!
//! [`FileDocumentStore`] reads that layout from a local directory (an export of the
//! hosted store, or a development fixture).

use crate::constants::{PATIENTS_COLLECTION, USERS_COLLECTION};
use crate::{TerminologyError, TerminologyResult};
use async_trait::async_trait;
use ayush_types::{Doctor, Patient};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The profile stored at `users/{uid}`, if any.
    async fn doctor(&self, uid: &str) -> TerminologyResult<Option<Doctor>>;

    /// Patients whose `createdBy` equals `uid`.
    async fn patients_created_by(&self, uid: &str) -> TerminologyResult<Vec<Patient>>;
}

pub type SharedDocumentStore = Arc<dyn DocumentStore>;

/// Document store backed by JSON files on disk.
#[derive(Clone, Debug)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn users_dir(&self) -> PathBuf {
        self.root.join(USERS_COLLECTION)
    }

    fn patients_dir(&self) -> PathBuf {
        self.root.join(PATIENTS_COLLECTION)
    }
}

/// Document ids become file names, so they must be a single plain path component.
fn validate_document_id(id: &str) -> TerminologyResult<()> {
    let id = id.trim();
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains('\0')
    {
        return Err(TerminologyError::InvalidInput(format!(
            "invalid document id: {id:?}"
        )));
    }
    Ok(())
}

fn parse_document<T: serde::de::DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> TerminologyResult<T> {
    serde_json::from_str(contents).map_err(|source| TerminologyError::DocumentDeserialization {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn doctor(&self, uid: &str) -> TerminologyResult<Option<Doctor>> {
        validate_document_id(uid)?;
        let path = self.users_dir().join(format!("{}.json", uid.trim()));

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TerminologyError::DocumentRead(e)),
        };

        let mut doctor: Doctor = parse_document(&path, &contents)?;
        if doctor.uid.is_empty() {
            doctor.uid = uid.trim().to_string();
        }
        Ok(Some(doctor))
    }

    async fn patients_created_by(&self, uid: &str) -> TerminologyResult<Vec<Patient>> {
        validate_document_id(uid)?;
        let uid = uid.trim();

        let mut entries = match tokio::fs::read_dir(self.patients_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TerminologyError::DocumentRead(e)),
        };

        let mut patients = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(TerminologyError::DocumentRead)?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!("failed to read patient document {}: {}", path.display(), e);
                    continue;
                }
            };

            let mut patient: Patient = match parse_document(&path, &contents) {
                Ok(patient) => patient,
                Err(e) => {
                    tracing::warn!("{}", e);
                    continue;
                }
            };
            if patient.created_by != uid {
                continue;
            }
            if patient.id.is_empty() {
                patient.id = path
                    .file_stem()
                    .and_then(|os| os.to_str())
                    .unwrap_or("")
                    .to_string();
            }
            patients.push(patient);
        }

        patients.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(patients)
    }
}
