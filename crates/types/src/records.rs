//! Doctor and patient documents read from the document store, and the current user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A doctor profile stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(default)]
    pub uid: String,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A patient document from the `patients` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "condition")]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    /// Uid of the doctor who created the record.
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The authenticated caller, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl CurrentUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_reads_camel_case_document() {
        let json = r#"{"id": "p1", "name": "Asha", "age": 41, "condition": "Jvara", "createdBy": "doc-1", "createdAt": "2024-03-01T10:00:00Z"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.created_by, "doc-1");
        assert_eq!(patient.diagnosis.as_deref(), Some("Jvara"));
        assert!(patient.created_at.is_some());
    }

    #[test]
    fn doctor_accepts_name_alias() {
        let doctor: Doctor =
            serde_json::from_str(r#"{"uid": "doc-1", "name": "Dr. Rao"}"#).unwrap();
        assert_eq!(doctor.display_name.as_deref(), Some("Dr. Rao"));
    }
}
