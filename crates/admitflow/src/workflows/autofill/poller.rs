use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::extraction::{ExtractionSnapshot, SectionMapper};
use super::step_store::StepDataStore;
use super::transforms;
use crate::config::OcrConfig;
use crate::workflows::admissions::ApplicationId;

/// Fetch boundary for the extraction-results endpoint.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    async fn fetch(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ExtractionSnapshot, ExtractionFetchError>;
}

#[async_trait]
impl<E> ExtractionGateway for std::sync::Arc<E>
where
    E: ExtractionGateway + ?Sized,
{
    async fn fetch(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ExtractionSnapshot, ExtractionFetchError> {
        (**self).fetch(application_id).await
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionFetchError {
    #[error("extraction transport failure: {0}")]
    Transport(String),
    #[error("extraction endpoint returned server error (status {0})")]
    ServerStatus(u16),
    #[error("extraction endpoint refused the request (status {0})")]
    Rejected(u16),
    #[error("extraction payload could not be decoded: {0}")]
    Decode(String),
}

impl ExtractionFetchError {
    /// Transport hiccups and 5xx responses are worth retrying inside the
    /// attempt bound; refusals and undecodable payloads are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractionFetchError::Transport(_) | ExtractionFetchError::ServerStatus(_)
        )
    }
}

/// Terminal outcome of one autofill run; the caller's messaging differs for
/// every variant, so none may be conflated.
#[derive(Debug, Clone, PartialEq)]
pub enum AutofillOutcome {
    /// Extraction finished and populated this many empty fields.
    Populated { fields: usize },
    /// Extraction finished but nothing usable was written.
    NoFields,
    /// The attempt bound elapsed while documents were still processing.
    TimedOut,
    /// An unrecoverable fetch error ended polling early.
    Failed(ExtractionFetchError),
}

/// Polling cadence; both knobs are explicit inputs so tests can collapse the
/// schedule to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPlan {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPlan {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for PollPlan {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2_000),
            max_attempts: 15,
        }
    }
}

/// Bounded-polling engine that discovers completed OCR extraction and merges
/// it into the step store exactly once per run.
pub struct AutofillEngine<E> {
    gateway: E,
    mapper: SectionMapper,
    plan: PollPlan,
}

impl<E> AutofillEngine<E>
where
    E: ExtractionGateway,
{
    pub fn new(gateway: E, mapper: SectionMapper, plan: PollPlan) -> Self {
        Self {
            gateway,
            mapper,
            plan,
        }
    }

    pub fn gateway(&self) -> &E {
        &self.gateway
    }

    /// Poll until extraction is ready, the attempt bound elapses, or an
    /// unrecoverable error occurs, then merge the first ready payload.
    ///
    /// Transient fetch errors consume an attempt and are retried silently;
    /// only bound exhaustion surfaces, as a timeout distinct from failure.
    pub async fn run(
        &self,
        application_id: &ApplicationId,
        store: &mut StepDataStore,
    ) -> AutofillOutcome {
        store.activate(application_id);

        for attempt in 1..=self.plan.max_attempts {
            match self.gateway.fetch(application_id).await {
                Ok(snapshot) if snapshot.is_ready() => {
                    debug!(
                        application = %application_id.0,
                        attempt,
                        "extraction ready; merging"
                    );
                    return self.merge_snapshot(&snapshot, store);
                }
                Ok(snapshot) => {
                    debug!(
                        application = %application_id.0,
                        attempt,
                        pending = snapshot.metadata.ocr_pending,
                        "extraction still processing"
                    );
                }
                Err(err) if err.is_transient() => {
                    debug!(
                        application = %application_id.0,
                        attempt,
                        error = %err,
                        "transient extraction fetch error; will retry"
                    );
                }
                Err(err) => {
                    warn!(
                        application = %application_id.0,
                        attempt,
                        error = %err,
                        "unrecoverable extraction fetch error; aborting autofill"
                    );
                    return AutofillOutcome::Failed(err);
                }
            }

            if attempt < self.plan.max_attempts && !self.plan.interval.is_zero() {
                sleep(self.plan.interval).await;
            }
        }

        warn!(
            application = %application_id.0,
            attempts = self.plan.max_attempts,
            "extraction polling exhausted its attempt bound"
        );
        AutofillOutcome::TimedOut
    }

    fn merge_snapshot(
        &self,
        snapshot: &ExtractionSnapshot,
        store: &mut StepDataStore,
    ) -> AutofillOutcome {
        let mut written = 0usize;

        for section in snapshot.all_sections() {
            let Some(mapping) = self.mapper.mapping_for(&section.document_type) else {
                debug!(
                    document_type = %section.document_type,
                    document = %section.source_document_id,
                    "no step mapping for extracted document type; skipping"
                );
                continue;
            };

            let mut fields = section.extracted_data.clone();
            transforms::apply_all(&mapping.transforms, &mut fields);

            for (key, value) in fields {
                if store.write_ocr_field_if_user_empty(mapping.step, &key, value) {
                    written += 1;
                }
            }
        }

        if written > 0 {
            AutofillOutcome::Populated { fields: written }
        } else {
            AutofillOutcome::NoFields
        }
    }
}

/// reqwest-backed gateway for the extraction-results endpoint.
pub struct HttpExtractionGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExtractionGateway {
    pub fn new(config: &OcrConfig) -> Result<Self, ExtractionFetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| ExtractionFetchError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ExtractionGateway for HttpExtractionGateway {
    async fn fetch(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ExtractionSnapshot, ExtractionFetchError> {
        let url = format!(
            "{}/applications/{}/extracted-data",
            self.base_url, application_id.0
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| ExtractionFetchError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ExtractionFetchError::ServerStatus(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ExtractionFetchError::Rejected(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|err| ExtractionFetchError::Decode(err.to_string()))
    }
}
