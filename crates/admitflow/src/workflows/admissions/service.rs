use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use super::domain::{
    galaxy_path_for, ActorRole, ApplicationId, ApplicationStage, StaffId, SyncStatus,
};
use super::galaxy::GalaxyGateway;
use super::guards::{TransitionGuard, TransitionRefusal};
use super::listing::{ListFilters, PageRequest};
use super::repository::{ApplicationRecord, ApplicationRepository, RepositoryError};
use super::sync::{self, SyncPolicy, SyncReport};

/// Service composing the transition guards, sync checker, repository, and
/// Galaxy gateway.
pub struct AdmissionsService<R, G> {
    repository: Arc<R>,
    galaxy: Arc<G>,
    sync_policy: SyncPolicy,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, G> AdmissionsService<R, G>
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    pub fn new(repository: Arc<R>, galaxy: Arc<G>, sync_policy: SyncPolicy) -> Self {
        Self {
            repository,
            galaxy,
            sync_policy,
        }
    }

    pub fn sync_policy(&self) -> &SyncPolicy {
        &self.sync_policy
    }

    /// Open a new draft application.
    pub fn create_draft(
        &self,
        student_id: Option<String>,
        agent_id: Option<String>,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let record =
            ApplicationRecord::new_draft(next_application_id(), student_id, agent_id, Utc::now());
        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn list(
        &self,
        filters: &ListFilters,
        page: &PageRequest,
    ) -> Result<Vec<ApplicationRecord>, AdmissionsServiceError> {
        Ok(self.repository.list(filters, page)?)
    }

    /// Evaluate the Galaxy propagation snapshot for one application.
    pub fn sync_report(&self, id: &ApplicationId) -> Result<SyncReport, AdmissionsServiceError> {
        let record = self.get(id)?;
        Ok(sync::evaluate(&record.sync_metadata, &self.sync_policy))
    }

    /// Advance an application to a later stage.
    ///
    /// Guard refusal is a local pre-flight decision made before the
    /// repository is touched for writing.
    pub fn advance(
        &self,
        id: &ApplicationId,
        target: ApplicationStage,
        role: ActorRole,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let mut record = self.get(id)?;
        let sync = sync::evaluate(&record.sync_metadata, &self.sync_policy);

        TransitionGuard::authorize(record.stage, target, role, &sync)?;

        let previous = record.stage;
        record.stage = target;
        if target == ApplicationStage::Submitted && record.submitted_at.is_none() {
            record.submitted_at = Some(Utc::now());
        }
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;

        info!(
            application = %record.id.0,
            from = previous.as_str(),
            to = target.as_str(),
            role = role.label(),
            "application stage advanced"
        );
        Ok(record)
    }

    /// Reject an application with a bounded, human-supplied reason.
    pub fn reject(
        &self,
        id: &ApplicationId,
        reason: &str,
        role: ActorRole,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        TransitionGuard::validate_rejection_reason(reason)?;

        let mut record = self.get(id)?;
        let sync = sync::evaluate(&record.sync_metadata, &self.sync_policy);
        TransitionGuard::authorize(record.stage, ApplicationStage::Rejected, role, &sync)?;

        record.stage = ApplicationStage::Rejected;
        record.rejection_reason = Some(reason.trim().to_string());
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;

        info!(application = %record.id.0, "application rejected");
        Ok(record)
    }

    /// Assign or reassign the responsible staff member (staff-admin only).
    pub fn assign_staff(
        &self,
        id: &ApplicationId,
        staff_id: Option<StaffId>,
        role: ActorRole,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        TransitionGuard::authorize_assignment(role)?;

        let mut record = self.get(id)?;
        record.assigned_staff_id = staff_id;
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// Flip the orthogonal archive flag; reversible, never a stage change.
    pub fn set_archived(
        &self,
        id: &ApplicationId,
        archived: bool,
        role: ActorRole,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let mut record = self.get(id)?;
        TransitionGuard::authorize_archive(record.stage, role)?;

        record.archived = archived;
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// Propagate one section to Galaxy, recording the attempt either way.
    ///
    /// Failures are recorded on the section's status and block sync-gated
    /// transitions until a human re-triggers the section; the checker itself
    /// never retries.
    pub async fn sync_section(
        &self,
        id: &ApplicationId,
        section: &str,
    ) -> Result<SyncOutcome, AdmissionsServiceError> {
        if galaxy_path_for(section).is_none() {
            return Err(AdmissionsServiceError::UnknownSection(section.to_string()));
        }

        let mut record = self.get(id)?;
        let previous_attempts = record
            .sync_metadata
            .get(section)
            .and_then(|status| status.as_ref().map(|status| status.attempt_count))
            .unwrap_or(0);

        let outcome = match self.galaxy.sync_section(id, section).await {
            Ok(status) => {
                record.sync_metadata.insert(
                    section.to_string(),
                    Some(SyncStatus::succeeded(Utc::now(), previous_attempts)),
                );
                SyncOutcome::Synced { status }
            }
            Err(err) => {
                let previous = record
                    .sync_metadata
                    .get(section)
                    .and_then(|status| status.as_ref())
                    .cloned();
                record.sync_metadata.insert(
                    section.to_string(),
                    Some(SyncStatus::failed(err.to_string(), previous.as_ref())),
                );
                SyncOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        record.updated_at = Utc::now();
        self.repository.update(record)?;
        Ok(outcome)
    }
}

/// Result of a single section sync attempt, after the status record has been
/// updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { status: String },
    Failed { error: String },
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsServiceError {
    #[error(transparent)]
    Refused(#[from] TransitionRefusal),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("unknown section '{0}'")]
    UnknownSection(String),
}
