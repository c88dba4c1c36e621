use serde::Serialize;
use std::collections::BTreeSet;

use super::domain::SyncMetadata;

/// Which sections the completeness check may disregard.
#[derive(Debug, Clone, Default)]
pub struct SyncPolicy {
    /// Sections excluded from the check entirely.
    pub ignored_sections: BTreeSet<String>,
    /// Sections allowed to have no sync record at all (not applicable to
    /// every application type).
    pub allow_null_if_ignored: BTreeSet<String>,
    /// When set, a recorded error disqualifies an otherwise up-to-date section.
    pub require_no_errors: bool,
}

impl SyncPolicy {
    pub fn strict() -> Self {
        Self {
            ignored_sections: BTreeSet::new(),
            allow_null_if_ignored: BTreeSet::new(),
            require_no_errors: true,
        }
    }
}

/// Outcome of a completeness evaluation over one sync-metadata snapshot.
///
/// The failing-section enumeration is part of the contract: callers render it
/// as the remediation list telling a human which sections to re-sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub failing_sections: Vec<String>,
}

impl SyncReport {
    pub fn complete() -> Self {
        Self {
            failing_sections: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failing_sections.is_empty()
    }
}

/// Evaluate whether every tracked section has propagated to Galaxy.
///
/// Pure snapshot evaluation; the caller fetches the metadata and hands in an
/// immutable view.
pub fn evaluate(metadata: &SyncMetadata, policy: &SyncPolicy) -> SyncReport {
    let mut failing_sections = Vec::new();

    for (section, status) in metadata {
        if policy.ignored_sections.contains(section) {
            continue;
        }

        let satisfied = match status {
            None => policy.allow_null_if_ignored.contains(section),
            Some(status) => {
                status.uptodate
                    && status.last_synced_at.is_some()
                    && (!policy.require_no_errors || status.last_error.is_none())
            }
        };

        if !satisfied {
            failing_sections.push(section.clone());
        }
    }

    SyncReport { failing_sections }
}

pub fn is_sync_complete(metadata: &SyncMetadata, policy: &SyncPolicy) -> bool {
    evaluate(metadata, policy).is_complete()
}
