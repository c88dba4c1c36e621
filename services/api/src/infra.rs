use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;

use admitflow::workflows::admissions::{
    ApplicationId, ApplicationRecord, ApplicationRepository, GalaxyGateway, GalaxySyncError,
    ListFilters, PageRequest, RepositoryError, SyncPolicy,
};
use admitflow::workflows::autofill::{
    DocumentGateway, ExtractionFetchError, ExtractionGateway, ExtractionSnapshot, PollPlan,
    StepDataStore, UploadError, UploadReceipt, UploadRequest,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    /// One step-data cache per application; each store stays bound to its id.
    pub(crate) steps: Arc<Mutex<HashMap<ApplicationId, StepDataStore>>>,
    pub(crate) documents: Arc<dyn DocumentGateway>,
    pub(crate) extraction: Arc<dyn ExtractionGateway>,
    pub(crate) poll_plan: PollPlan,
}

pub(crate) fn default_sync_policy() -> SyncPolicy {
    SyncPolicy::strict()
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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

/// Galaxy stand-in for demos and tests: every section sync succeeds and the
/// call log is kept for assertions.
#[derive(Default)]
pub(crate) struct InMemoryGalaxyGateway {
    calls: Mutex<Vec<(ApplicationId, String)>>,
}

impl InMemoryGalaxyGateway {
    pub(crate) fn calls(&self) -> Vec<(ApplicationId, String)> {
        self.calls.lock().expect("galaxy mutex poisoned").clone()
    }
}

#[async_trait]
impl GalaxyGateway for InMemoryGalaxyGateway {
    async fn sync_section(
        &self,
        application_id: &ApplicationId,
        section: &str,
    ) -> Result<String, GalaxySyncError> {
        self.calls
            .lock()
            .expect("galaxy mutex poisoned")
            .push((application_id.clone(), section.to_string()));
        Ok("synced".to_string())
    }
}

/// Document store stand-in that accepts every upload.
#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    sequence: Mutex<u64>,
}

#[async_trait]
impl DocumentGateway for InMemoryDocumentStore {
    async fn upload(&self, _request: UploadRequest) -> Result<UploadReceipt, UploadError> {
        let mut sequence = self.sequence.lock().expect("sequence mutex poisoned");
        *sequence += 1;
        Ok(UploadReceipt {
            document_id: format!("doc-{:04}", *sequence),
        })
    }
}

/// Extraction stand-in replaying a scripted sequence of poll results; once
/// exhausted it keeps repeating the final entry.
pub(crate) struct ScriptedExtractionGateway {
    script: Mutex<VecDeque<Result<ExtractionSnapshot, ExtractionFetchError>>>,
    last: Mutex<Option<Result<ExtractionSnapshot, ExtractionFetchError>>>,
}

impl ScriptedExtractionGateway {
    pub(crate) fn new(script: Vec<Result<ExtractionSnapshot, ExtractionFetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ExtractionGateway for ScriptedExtractionGateway {
    async fn fetch(
        &self,
        _application_id: &ApplicationId,
    ) -> Result<ExtractionSnapshot, ExtractionFetchError> {
        if let Some(next) = self.script.lock().expect("script poisoned").pop_front() {
            *self.last.lock().expect("last poisoned") = Some(next.clone());
            return next;
        }

        self.last
            .lock()
            .expect("last poisoned")
            .clone()
            .unwrap_or_else(|| {
                Err(ExtractionFetchError::Transport(
                    "extraction script exhausted".to_string(),
                ))
            })
    }
}
