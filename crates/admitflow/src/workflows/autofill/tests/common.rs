use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::workflows::admissions::ApplicationId;
use crate::workflows::autofill::extraction::{
    ExtractionMetadata, ExtractionSnapshot, OcrSection, OneOrMany,
};
use crate::workflows::autofill::poller::{ExtractionFetchError, ExtractionGateway, PollPlan};

pub(super) fn app_id(raw: &str) -> ApplicationId {
    ApplicationId(raw.to_string())
}

pub(super) fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

/// Zero-interval plan so poll loops complete without waiting on timers.
pub(super) fn immediate_plan(max_attempts: u32) -> PollPlan {
    PollPlan {
        interval: Duration::ZERO,
        max_attempts,
    }
}

pub(super) fn pending_snapshot(pending: u32) -> ExtractionSnapshot {
    ExtractionSnapshot {
        sections: Default::default(),
        metadata: ExtractionMetadata {
            ocr_pending: pending,
        },
    }
}

pub(super) fn ready_snapshot(sections: Vec<(&str, OcrSection)>) -> ExtractionSnapshot {
    let mut map = std::collections::BTreeMap::new();
    for (name, section) in sections {
        map.insert(name.to_string(), OneOrMany::One(section));
    }
    ExtractionSnapshot {
        sections: map,
        metadata: ExtractionMetadata { ocr_pending: 0 },
    }
}

pub(super) fn passport_section(extracted: Value) -> OcrSection {
    OcrSection {
        source_document_id: "doc-101".to_string(),
        document_type: "passport".to_string(),
        extracted_data: fields(extracted),
        confidence_scores: std::collections::BTreeMap::from([("given_name".to_string(), 0.97)]),
    }
}

/// Gateway fake replaying a scripted sequence of poll results; the last entry
/// repeats once the script runs out.
pub(super) struct ScriptedExtractionGateway {
    script: Mutex<VecDeque<Result<ExtractionSnapshot, ExtractionFetchError>>>,
    repeat_last: Option<Result<ExtractionSnapshot, ExtractionFetchError>>,
    pub(super) fetch_count: Mutex<u32>,
}

impl ScriptedExtractionGateway {
    pub(super) fn new(
        script: Vec<Result<ExtractionSnapshot, ExtractionFetchError>>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat_last: None,
            fetch_count: Mutex::new(0),
        }
    }

    pub(super) fn repeating(result: Result<ExtractionSnapshot, ExtractionFetchError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat_last: Some(result),
            fetch_count: Mutex::new(0),
        }
    }

    pub(super) fn fetches(&self) -> u32 {
        *self.fetch_count.lock().expect("fetch counter poisoned")
    }
}

#[async_trait]
impl ExtractionGateway for ScriptedExtractionGateway {
    async fn fetch(
        &self,
        _application_id: &ApplicationId,
    ) -> Result<ExtractionSnapshot, ExtractionFetchError> {
        *self.fetch_count.lock().expect("fetch counter poisoned") += 1;

        if let Some(next) = self.script.lock().expect("script poisoned").pop_front() {
            return next;
        }

        match &self.repeat_last {
            Some(result) => result.clone(),
            None => Err(ExtractionFetchError::Transport(
                "script exhausted".to_string(),
            )),
        }
    }
}
