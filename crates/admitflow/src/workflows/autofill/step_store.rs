use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::merge::{is_empty_value, merged_view};
use crate::workflows::admissions::ApplicationId;

/// Draft payloads for one form step: what the user typed and what OCR
/// extracted, kept on disjoint keys so neither source can clobber the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepEntry {
    pub user_data: Map<String, Value>,
    pub ocr_data: Map<String, Value>,
}

/// Keyed container for the multi-step draft form, scoped to one application.
///
/// Entries are created lazily on first access; switching the active
/// application clears every step unconditionally so data can never leak
/// between applications.
#[derive(Debug, Default)]
pub struct StepDataStore {
    active: Option<ApplicationId>,
    steps: BTreeMap<u32, StepEntry>,
}

impl StepDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_application(&self) -> Option<&ApplicationId> {
        self.active.as_ref()
    }

    /// Bind the store to an application, clearing all step data when the
    /// active id changes.
    pub fn activate(&mut self, application_id: &ApplicationId) {
        if self.active.as_ref() == Some(application_id) {
            return;
        }

        if let Some(previous) = &self.active {
            debug!(
                from = %previous.0,
                to = %application_id.0,
                "active application changed; clearing step data"
            );
        }

        self.steps.clear();
        self.active = Some(application_id.clone());
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.active = None;
    }

    pub fn user_data(&self, step: u32) -> Option<&Map<String, Value>> {
        self.steps.get(&step).map(|entry| &entry.user_data)
    }

    pub fn ocr_data(&self, step: u32) -> Option<&Map<String, Value>> {
        self.steps.get(&step).map(|entry| &entry.ocr_data)
    }

    /// Upsert user-edited fields for a step; last write wins per field.
    pub fn write_user_fields(&mut self, step: u32, values: Map<String, Value>) {
        let entry = self.steps.entry(step).or_default();
        for (key, value) in values {
            entry.user_data.insert(key, value);
        }
    }

    /// Record an OCR-derived field, but only when the user has not already
    /// filled the corresponding field. Returns whether the field was written.
    pub fn write_ocr_field_if_user_empty(&mut self, step: u32, key: &str, value: Value) -> bool {
        let entry = self.steps.entry(step).or_default();

        if !is_empty_value(entry.user_data.get(key)) {
            return false;
        }

        entry.ocr_data.insert(key.to_string(), value);
        true
    }

    /// The merged user-over-OCR view for a step, computed on read.
    pub fn merged_view(&self, step: u32) -> Map<String, Value> {
        match self.steps.get(&step) {
            Some(entry) => merged_view(&entry.user_data, &entry.ocr_data),
            None => Map::new(),
        }
    }
}
