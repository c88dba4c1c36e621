use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::workflows::admissions::domain::{ApplicationId, ApplicationStage, SyncStatus};
use crate::workflows::admissions::galaxy::{GalaxyGateway, GalaxySyncError};
use crate::workflows::admissions::listing::{ListFilters, PageRequest};
use crate::workflows::admissions::repository::{
    ApplicationRecord, ApplicationRepository, RepositoryError,
};
use crate::workflows::admissions::service::AdmissionsService;
use crate::workflows::admissions::sync::SyncPolicy;

pub(super) fn synced_status() -> SyncStatus {
    SyncStatus {
        last_synced_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()),
        last_error: None,
        attempt_count: 1,
        uptodate: true,
    }
}

pub(super) fn stale_status() -> SyncStatus {
    SyncStatus {
        last_synced_at: None,
        last_error: None,
        attempt_count: 0,
        uptodate: false,
    }
}

pub(super) fn errored_status() -> SyncStatus {
    SyncStatus {
        last_synced_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()),
        last_error: Some("galaxy timeout".to_string()),
        attempt_count: 3,
        uptodate: true,
    }
}

pub(super) fn build_service() -> (
    AdmissionsService<MemoryRepository, ScriptedGalaxy>,
    Arc<MemoryRepository>,
    Arc<ScriptedGalaxy>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let galaxy = Arc::new(ScriptedGalaxy::default());
    let service = AdmissionsService::new(repository.clone(), galaxy.clone(), SyncPolicy::strict());
    (service, repository, galaxy)
}

/// Drive a record straight to a given stage, bypassing guards; used to set up
/// scenarios without replaying the whole lifecycle each time.
pub(super) fn force_stage(
    repository: &MemoryRepository,
    record: &ApplicationRecord,
    stage: ApplicationStage,
) {
    let mut forced = record.clone();
    forced.stage = stage;
    repository.update(forced).expect("forced stage update");
}

pub(super) fn mark_all_sections_synced(repository: &MemoryRepository, id: &ApplicationId) {
    let mut record = repository
        .fetch(id)
        .expect("fetch succeeds")
        .expect("record present");
    for (section, _) in crate::workflows::admissions::domain::KNOWN_SECTIONS {
        record
            .sync_metadata
            .insert(section.to_string(), Some(synced_status()));
    }
    repository.update(record).expect("sync metadata update");
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(
        &self,
        filters: &ListFilters,
        page: &PageRequest,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matching: Vec<ApplicationRecord> = guard
            .values()
            .filter(|record| filters.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching
            .into_iter()
            .skip(page.offset())
            .take(page.per_page as usize)
            .collect())
    }
}

/// Galaxy fake that succeeds by default and fails for sections placed on its
/// deny list.
#[derive(Default)]
pub(super) struct ScriptedGalaxy {
    failing_sections: Mutex<Vec<String>>,
    pub(super) calls: Mutex<Vec<String>>,
}

impl ScriptedGalaxy {
    pub(super) fn fail_section(&self, section: &str) {
        self.failing_sections
            .lock()
            .expect("galaxy mutex poisoned")
            .push(section.to_string());
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.lock().expect("galaxy mutex poisoned").len()
    }
}

#[async_trait]
impl GalaxyGateway for ScriptedGalaxy {
    async fn sync_section(
        &self,
        _application_id: &ApplicationId,
        section: &str,
    ) -> Result<String, GalaxySyncError> {
        self.calls
            .lock()
            .expect("galaxy mutex poisoned")
            .push(section.to_string());

        let failing = self
            .failing_sections
            .lock()
            .expect("galaxy mutex poisoned")
            .contains(&section.to_string());
        if failing {
            Err(GalaxySyncError::Transport("connection reset".to_string()))
        } else {
            Ok("synced".to_string())
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
