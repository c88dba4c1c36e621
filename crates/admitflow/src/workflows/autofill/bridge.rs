use serde_json::{Map, Value};
use std::time::{Duration, Instant};

use super::step_store::StepDataStore;
use crate::workflows::admissions::ApplicationId;

/// Binds one step's editable form to the step store.
///
/// The bridge is an explicit deadline-driven state machine: edits arm a
/// debounce deadline, the caller pumps [`FormPersistenceBridge::flush_due`]
/// from its event loop, and submit paths call
/// [`FormPersistenceBridge::flush`] so the newest keystrokes always land
/// before anything irreversible happens.
#[derive(Debug)]
pub struct FormPersistenceBridge {
    application_id: ApplicationId,
    step: u32,
    debounce: Duration,
    dirty: bool,
    pending: Option<PendingWrite>,
}

#[derive(Debug)]
struct PendingWrite {
    values: Map<String, Value>,
    due_at: Instant,
}

impl FormPersistenceBridge {
    pub fn new(application_id: ApplicationId, step: u32, debounce: Duration) -> Self {
        Self {
            application_id,
            step,
            debounce,
            dirty: false,
            pending: None,
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Unsaved local edits exist (pending debounce or unflushed form state).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Compute the merged view for form hydration.
    ///
    /// Returns `None` while the form is dirty: hydration over in-flight
    /// typing would clobber it, so late OCR arrivals wait until the next
    /// clean state.
    pub fn hydrate(&mut self, store: &mut StepDataStore) -> Option<Map<String, Value>> {
        if self.dirty {
            return None;
        }

        store.activate(&self.application_id);
        Some(store.merged_view(self.step))
    }

    /// Record a form change, replacing any pending write and re-arming the
    /// debounce deadline.
    pub fn record_change(&mut self, values: Map<String, Value>, now: Instant) {
        self.dirty = true;
        self.pending = Some(PendingWrite {
            values,
            due_at: now + self.debounce,
        });
    }

    /// Persist the pending write if its deadline has passed. Returns whether
    /// a write happened.
    pub fn flush_due(&mut self, store: &mut StepDataStore, now: Instant) -> bool {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.due_at);
        if !due {
            return false;
        }

        self.write_pending(store);
        // The store is authoritative again once the write lands.
        self.dirty = false;
        true
    }

    /// Synchronously persist any pending write, regardless of its deadline.
    ///
    /// Called on submit and unmount so the final edit is flushed, never
    /// dropped. Clears the dirty flag: the store now holds the form state.
    pub fn flush(&mut self, store: &mut StepDataStore) -> bool {
        let wrote = self.pending.is_some();
        self.write_pending(store);
        self.dirty = false;
        wrote
    }

    fn write_pending(&mut self, store: &mut StepDataStore) {
        if let Some(pending) = self.pending.take() {
            store.activate(&self.application_id);
            store.write_user_fields(self.step, pending.values);
        }
    }
}
