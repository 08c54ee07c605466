//! Saved draft of the in-progress form input.
//!
//! The form layer keeps one snapshot of what the user has typed so far
//! and restores it on the next visit.  It depends on the
//! [`DraftRepository`] trait rather than on a concrete store; the
//! comparison engine never touches drafts.

use crate::models::CompensationInput;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored draft is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("draft store lock poisoned")]
    Poisoned,
}

/// Storage for a single draft snapshot.
pub trait DraftRepository: Send + Sync {
    /// The saved draft, if any.
    fn load(&self) -> Result<Option<CompensationInput>, DraftError>;
    /// Replace the saved draft.
    fn save(&self, draft: &CompensationInput) -> Result<(), DraftError>;
    /// Forget the saved draft.  Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), DraftError>;
}

/// Draft kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryDraftRepository {
    draft: RwLock<Option<CompensationInput>>,
}

impl DraftRepository for InMemoryDraftRepository {
    fn load(&self) -> Result<Option<CompensationInput>, DraftError> {
        let draft = self.draft.read().map_err(|_| DraftError::Poisoned)?;
        Ok(draft.clone())
    }

    fn save(&self, draft: &CompensationInput) -> Result<(), DraftError> {
        let mut slot = self.draft.write().map_err(|_| DraftError::Poisoned)?;
        *slot = Some(draft.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), DraftError> {
        let mut slot = self.draft.write().map_err(|_| DraftError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// Draft stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileDraftRepository {
    path: PathBuf,
}

impl JsonFileDraftRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileDraftRepository { path: path.into() }
    }

    /// Sibling file the draft is written to before replacing `path`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DraftRepository for JsonFileDraftRepository {
    fn load(&self) -> Result<Option<CompensationInput>, DraftError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn save(&self, draft: &CompensationInput) -> Result<(), DraftError> {
        let data = serde_json::to_string_pretty(draft)?;
        // Replace atomically so an interrupted write never leaves a torn draft.
        let staging = self.staging_path();
        std::fs::write(&staging, data)?;
        std::fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), "saved draft");
        Ok(())
    }

    fn clear(&self) -> Result<(), DraftError> {
        match std::fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyTaxRegime, PjTransport};

    fn draft() -> CompensationInput {
        CompensationInput {
            clt_gross_salary: 5000.0,
            has_fgts: true,
            pj_gross_monthly: 7000.0,
            pj_company_tax_regime: CompanyTaxRegime::LucroPresumido,
            pj_transport: PjTransport::PublicTransit { monthly_cost: 250.0 },
            ..Default::default()
        }
    }

    fn exercise(repo: &dyn DraftRepository) {
        assert!(repo.load().unwrap().is_none());
        repo.save(&draft()).unwrap();
        assert_eq!(repo.load().unwrap(), Some(draft()));
        repo.clear().unwrap();
        assert!(repo.load().unwrap().is_none());
        repo.clear().unwrap();
    }

    #[test]
    fn test_in_memory_repository() {
        exercise(&InMemoryDraftRepository::default());
    }

    #[test]
    fn test_json_file_repository() {
        let path = std::env::temp_dir().join(format!("regime-draft-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        exercise(&JsonFileDraftRepository::new(&path));
    }

    #[test]
    fn test_save_replaces_previous_draft_without_leftovers() {
        let path =
            std::env::temp_dir().join(format!("regime-draft-replace-{}.json", std::process::id()));
        let repo = JsonFileDraftRepository::new(&path);
        repo.save(&CompensationInput::default()).unwrap();
        repo.save(&draft()).unwrap();

        let staging_exists = repo.staging_path().exists();
        let loaded = repo.load().unwrap();
        repo.clear().unwrap();
        assert!(!staging_exists);
        assert_eq!(loaded, Some(draft()));
    }

    #[test]
    fn test_unfinished_staging_file_does_not_affect_saved_draft() {
        let path =
            std::env::temp_dir().join(format!("regime-draft-staging-{}.json", std::process::id()));
        let repo = JsonFileDraftRepository::new(&path);
        repo.save(&draft()).unwrap();
        std::fs::write(repo.staging_path(), "{ \"cltGross").unwrap();

        let loaded = repo.load().unwrap();
        std::fs::remove_file(repo.staging_path()).unwrap();
        repo.clear().unwrap();
        assert_eq!(loaded, Some(draft()));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let path =
            std::env::temp_dir().join(format!("regime-draft-corrupt-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();
        let err = JsonFileDraftRepository::new(&path).load().unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, DraftError::Corrupt(_)));
    }
}
