//! CSV upload gate and uploader.
//!
//! The gate is a client-side convenience: it decides whether the upload control is
//! offered at all. The backend must enforce its own authorisation.

use crate::api::SharedApi;
use crate::constants::{ADMIN_DISPLAY_NAME, ADMIN_EMAIL};
use crate::{TerminologyError, TerminologyResult};
use ayush_types::{CurrentUser, TerminologySystem};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether the current user may upload, and if not, the tooltip explaining why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadPermission {
    Enabled,
    Disabled { reason: String },
}

impl UploadPermission {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }

    pub fn tooltip(&self) -> Option<&str> {
        match self {
            Self::Enabled => None,
            Self::Disabled { reason } => Some(reason),
        }
    }
}

/// Restricts CSV upload to the single administrator identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadGate;

impl UploadGate {
    /// Enabled iff the display name is exactly `root` and the email exactly `root@gmail.com`.
    pub fn check(user: Option<&CurrentUser>) -> UploadPermission {
        let Some(user) = user else {
            return UploadPermission::Disabled {
                reason: "Sign in as the administrator to upload CSV files".into(),
            };
        };

        let is_admin = user.display_name.as_deref() == Some(ADMIN_DISPLAY_NAME)
            && user.email.as_deref() == Some(ADMIN_EMAIL);

        if is_admin {
            UploadPermission::Enabled
        } else {
            UploadPermission::Disabled {
                reason: "Only the administrator account can upload CSV files".into(),
            }
        }
    }
}

/// A CSV file destined for `/terminologies/{system}/csv/upload/`.
#[derive(Debug, Clone)]
pub struct CsvUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
    /// Ask the backend to rebuild its full-text search vectors after import.
    pub update_search_vector: bool,
}

impl CsvUpload {
    fn validate(&self) -> TerminologyResult<()> {
        if self.contents.is_empty() {
            return Err(TerminologyError::InvalidInput("CSV file is empty".into()));
        }
        if !self.file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(TerminologyError::InvalidInput(format!(
                "{} is not a .csv file",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// Backend response to a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "created_count")]
    pub created: u64,
    #[serde(default, alias = "updated_count")]
    pub updated: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Sends CSV files to the backend once the gate allows it.
#[derive(Clone)]
pub struct CsvUploader {
    api: SharedApi,
}

impl CsvUploader {
    pub fn new(api: SharedApi) -> Self {
        Self { api }
    }

    /// Upload a CSV file for one system.
    ///
    /// # Errors
    ///
    /// Returns a `TerminologyError` if:
    /// - the gate is closed for `user` (nothing is sent),
    /// - the file is empty or not a `.csv`,
    /// - the backend rejects the upload.
    pub async fn upload(
        &self,
        user: Option<&CurrentUser>,
        system: TerminologySystem,
        upload: CsvUpload,
    ) -> TerminologyResult<UploadReceipt> {
        if let UploadPermission::Disabled { reason } = UploadGate::check(user) {
            return Err(TerminologyError::UploadNotPermitted(reason));
        }
        upload.validate()?;

        let file_name = upload.file_name.clone();
        match self.api.upload_csv(system, upload).await {
            Ok(receipt) => {
                tracing::info!(
                    "uploaded {} to {}: {} created, {} updated",
                    file_name,
                    system,
                    receipt.created,
                    receipt.updated
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("CSV upload of {} to {} failed: {}", file_name, system, e);
                Err(e)
            }
        }
    }

    /// Read `path` and upload it.
    pub async fn upload_file(
        &self,
        user: Option<&CurrentUser>,
        system: TerminologySystem,
        path: &Path,
        update_search_vector: bool,
    ) -> TerminologyResult<UploadReceipt> {
        if let UploadPermission::Disabled { reason } = UploadGate::check(user) {
            return Err(TerminologyError::UploadNotPermitted(reason));
        }

        let contents = tokio::fs::read(path)
            .await
            .map_err(TerminologyError::UploadFileRead)?;
        let file_name = path
            .file_name()
            .and_then(|os| os.to_str())
            .unwrap_or("upload.csv")
            .to_string();

        self.upload(
            user,
            system,
            CsvUpload {
                file_name,
                contents,
                update_search_vector,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockTerminologyApi};
    use std::sync::Arc;

    fn admin() -> CurrentUser {
        CurrentUser::new("uid-root")
            .with_display_name("root")
            .with_email("root@gmail.com")
    }

    fn csv() -> CsvUpload {
        CsvUpload {
            file_name: "ayurveda.csv".into(),
            contents: b"code,english_name\nAY1,Jvara\n".to_vec(),
            update_search_vector: true,
        }
    }

    #[test]
    fn gate_opens_only_for_exact_admin_pair() {
        assert!(UploadGate::check(Some(&admin())).is_enabled());

        let wrong_email = CurrentUser::new("u")
            .with_display_name("root")
            .with_email("admin@gmail.com");
        assert!(!UploadGate::check(Some(&wrong_email)).is_enabled());

        let wrong_name = CurrentUser::new("u")
            .with_display_name("Root")
            .with_email("root@gmail.com");
        assert!(!UploadGate::check(Some(&wrong_name)).is_enabled());

        let missing_name = CurrentUser::new("u").with_email("root@gmail.com");
        assert!(!UploadGate::check(Some(&missing_name)).is_enabled());
    }

    #[test]
    fn anonymous_user_gets_tooltip() {
        let permission = UploadGate::check(None);
        assert!(!permission.is_enabled());
        assert!(permission.tooltip().unwrap().contains("administrator"));
    }

    #[test]
    fn permission_serializes_with_state_tag() {
        let json = serde_json::to_value(UploadGate::check(None)).unwrap();
        assert_eq!(json["state"], "disabled");
        let json = serde_json::to_value(UploadGate::check(Some(&admin()))).unwrap();
        assert_eq!(json["state"], "enabled");
    }

    #[tokio::test]
    async fn refused_upload_sends_nothing() {
        let api = Arc::new(MockTerminologyApi::new());
        let uploader = CsvUploader::new(api.clone());
        let user = CurrentUser::new("u").with_display_name("someone");

        let err = uploader
            .upload(Some(&user), TerminologySystem::Ayurveda, csv())
            .await
            .unwrap_err();

        assert!(matches!(err, TerminologyError::UploadNotPermitted(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn admin_upload_reaches_backend() {
        let api = Arc::new(MockTerminologyApi::new().with_upload_receipt(UploadReceipt {
            message: Some("ok".into()),
            created: 1,
            ..Default::default()
        }));
        let uploader = CsvUploader::new(api.clone());

        let receipt = uploader
            .upload(Some(&admin()), TerminologySystem::Siddha, csv())
            .await
            .unwrap();

        assert_eq!(receipt.created, 1);
        assert_eq!(
            api.calls(),
            vec![MockCall::Upload {
                system: TerminologySystem::Siddha,
                file_name: "ayurveda.csv".into(),
                update_search_vector: true,
            }]
        );
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced() {
        let api = Arc::new(MockTerminologyApi::new().failing_uploads());
        let uploader = CsvUploader::new(api);

        let err = uploader
            .upload(Some(&admin()), TerminologySystem::Unani, csv())
            .await
            .unwrap_err();
        assert!(matches!(err, TerminologyError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn rejects_non_csv_and_empty_files() {
        let api = Arc::new(MockTerminologyApi::new());
        let uploader = CsvUploader::new(api.clone());

        let mut upload = csv();
        upload.file_name = "terms.xlsx".into();
        assert!(matches!(
            uploader
                .upload(Some(&admin()), TerminologySystem::Icd11, upload)
                .await,
            Err(TerminologyError::InvalidInput(_))
        ));

        let mut upload = csv();
        upload.contents.clear();
        assert!(matches!(
            uploader
                .upload(Some(&admin()), TerminologySystem::Icd11, upload)
                .await,
            Err(TerminologyError::InvalidInput(_))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("unani.csv");
        std::fs::write(&path, "code,english_name\nU1,Humma\n").unwrap();

        let api = Arc::new(MockTerminologyApi::new());
        let uploader = CsvUploader::new(api.clone());
        uploader
            .upload_file(Some(&admin()), TerminologySystem::Unani, &path, false)
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![MockCall::Upload {
                system: TerminologySystem::Unani,
                file_name: "unani.csv".into(),
                update_search_vector: false,
            }]
        );
    }
}
