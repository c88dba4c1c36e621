use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::domain::ApplicationStage;
use super::repository::ApplicationRecord;

/// Page window for a keyed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        let page = self.page.max(1);
        ((page - 1) * self.per_page) as usize
    }
}

/// AND-combined list constraints; an unset field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilters {
    pub stage: Option<ApplicationStage>,
    pub student_id: Option<String>,
    pub agent_id: Option<String>,
    pub staff_id: Option<String>,
    pub submitted_from: Option<NaiveDate>,
    pub submitted_to: Option<NaiveDate>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

impl ListFilters {
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        if !self.include_archived && record.archived {
            return false;
        }

        if let Some(stage) = self.stage {
            if record.stage != stage {
                return false;
            }
        }

        if let Some(student_id) = &self.student_id {
            if record.student_id.as_deref() != Some(student_id.as_str()) {
                return false;
            }
        }

        if let Some(agent_id) = &self.agent_id {
            if record.agent_id.as_deref() != Some(agent_id.as_str()) {
                return false;
            }
        }

        if let Some(staff_id) = &self.staff_id {
            let assigned = record
                .assigned_staff_id
                .as_ref()
                .map(|id| id.0.as_str());
            if assigned != Some(staff_id.as_str()) {
                return false;
            }
        }

        if let Some(from) = self.submitted_from {
            match record.submitted_at {
                Some(at) if at.date_naive() >= from => {}
                _ => return false,
            }
        }

        if let Some(to) = self.submitted_to {
            match record.submitted_at {
                Some(at) if at.date_naive() <= to => {}
                _ => return false,
            }
        }

        if let Some(search) = &self.search {
            let needle = search.trim().to_ascii_lowercase();
            if !needle.is_empty() && !record_haystack(record).contains(&needle) {
                return false;
            }
        }

        true
    }

    /// Render the active constraints as outbound query parameters.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(stage) = self.stage {
            params.push(("stage", stage.as_str().to_string()));
        }
        if let Some(student_id) = &self.student_id {
            params.push(("student_id", student_id.clone()));
        }
        if let Some(agent_id) = &self.agent_id {
            params.push(("agent_id", agent_id.clone()));
        }
        if let Some(staff_id) = &self.staff_id {
            params.push(("staff_id", staff_id.clone()));
        }
        if let Some(from) = self.submitted_from {
            params.push(("submitted_from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.submitted_to {
            params.push(("submitted_to", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(search) = &self.search {
            if !search.trim().is_empty() {
                params.push(("search", search.trim().to_string()));
            }
        }
        if self.include_archived {
            params.push(("include_archived", "true".to_string()));
        }

        params
    }
}

fn record_haystack(record: &ApplicationRecord) -> String {
    let mut haystack = record.id.0.to_ascii_lowercase();
    for value in [&record.student_id, &record.agent_id] {
        if let Some(value) = value {
            haystack.push(' ');
            haystack.push_str(&value.to_ascii_lowercase());
        }
    }
    haystack
}

/// Per-list pagination and filter state, keyed by list key.
///
/// Explicitly scoped state with read/write/reset operations only; no caller
/// ever holds a mutable reference into the store.
#[derive(Debug, Default)]
pub struct ListStateStore {
    entries: HashMap<String, ListState>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub page: PageRequest,
    pub filters: ListFilters,
}

impl ListStateStore {
    pub fn get(&self, key: &str) -> ListState {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn set_page(&mut self, key: &str, page: PageRequest) {
        self.entries.entry(key.to_string()).or_default().page = page;
    }

    pub fn set_filters(&mut self, key: &str, filters: ListFilters) {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.filters = filters;
        // A filter change restarts pagination from the first page.
        entry.page.page = 1;
    }

    pub fn reset(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}
