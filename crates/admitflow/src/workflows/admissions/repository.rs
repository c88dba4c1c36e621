use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::domain::{
    display_label, kanban_placement, ActorRole, ApplicationId, ApplicationStage, KanbanPlacement,
    StaffId, SyncMetadata,
};
use super::listing::{ListFilters, PageRequest};

/// Repository record for one admissions application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub stage: ApplicationStage,
    pub archived: bool,
    pub student_id: Option<String>,
    pub agent_id: Option<String>,
    pub assigned_staff_id: Option<StaffId>,
    pub section_data: BTreeMap<String, Value>,
    pub sync_metadata: SyncMetadata,
    pub rejection_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn new_draft(
        id: ApplicationId,
        student_id: Option<String>,
        agent_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            stage: ApplicationStage::Draft,
            archived: false,
            student_id,
            agent_id,
            assigned_staff_id: None,
            section_data: BTreeMap::new(),
            sync_metadata: SyncMetadata::new(),
            rejection_reason: None,
            submitted_at: None,
            updated_at: now,
        }
    }

    pub fn status_view(&self, role: ActorRole) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            stage: self.stage,
            stage_label: display_label(self.stage, role),
            archived: self.archived,
            assigned_staff_id: self.assigned_staff_id.clone(),
            placement: kanban_placement(self.stage),
            rejection_reason: self.rejection_reason.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub stage: ApplicationStage,
    pub stage_label: &'static str,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<StaffId>,
    pub placement: KanbanPlacement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(
        &self,
        filters: &ListFilters,
        page: &PageRequest,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
