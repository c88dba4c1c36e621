use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Identifier wrapper for admissions applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for staff members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffId(pub String);

/// Discrete steps of the admissions lifecycle, in canonical order.
///
/// `Rejected` sits outside the canonical order as an alternate terminal;
/// ordering comparisons use [`ApplicationStage::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStage {
    Draft,
    Submitted,
    InReview,
    OfferLetter,
    GsAssessment,
    CoeIssued,
    Accepted,
    Rejected,
}

/// Legacy payload alias some backends emit for an accepted application.
const LEGACY_ACCEPTED_ALIAS: &str = "coe_issued_accepted";

impl ApplicationStage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Draft,
            Self::Submitted,
            Self::InReview,
            Self::OfferLetter,
            Self::GsAssessment,
            Self::CoeIssued,
            Self::Accepted,
        ]
    }

    /// Position in the canonical order; `None` for the `Rejected` branch.
    pub fn index(self) -> Option<usize> {
        Self::ordered().iter().position(|stage| *stage == self)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::InReview => "in_review",
            Self::OfferLetter => "offer_letter",
            Self::GsAssessment => "gs_assessment",
            Self::CoeIssued => "coe_issued",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::InReview => "In Review",
            Self::OfferLetter => "Offer Letter",
            Self::GsAssessment => "GS Assessment",
            Self::CoeIssued => "CoE Issued",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }

    /// Parse a backend stage string, failing closed to `Draft`.
    ///
    /// Unknown values are a data-integrity problem on the backend side; the
    /// fallback keeps the application visible while the warning makes the
    /// corruption observable.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized == LEGACY_ACCEPTED_ALIAS {
            warn!(
                stage = %raw,
                "backend payload conflates accepted with coe_issued; treating as accepted"
            );
            return Self::Accepted;
        }

        match normalized.as_str() {
            "draft" => Self::Draft,
            "submitted" => Self::Submitted,
            "in_review" => Self::InReview,
            "offer_letter" => Self::OfferLetter,
            "gs_assessment" => Self::GsAssessment,
            "coe_issued" => Self::CoeIssued,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => {
                warn!(stage = %raw, "unrecognized application stage; falling back to draft");
                Self::Draft
            }
        }
    }
}

/// Caller roles recognized by the lifecycle guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Student,
    Agent,
    Staff,
    StaffAdmin,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Agent => "Agent",
            Self::Staff => "Staff",
            Self::StaffAdmin => "Staff Admin",
        }
    }

    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::StaffAdmin)
    }
}

/// Role-aware stage wording with fallback to the stage-generic label.
pub fn display_label(stage: ApplicationStage, role: ActorRole) -> &'static str {
    match (role, stage) {
        (ActorRole::Agent, ApplicationStage::InReview) => "With Admissions Team",
        (ActorRole::Agent, ApplicationStage::OfferLetter) => "Offer Received",
        (ActorRole::Agent, ApplicationStage::CoeIssued) => "CoE Received",
        (ActorRole::Staff | ActorRole::StaffAdmin, ApplicationStage::Submitted) => "New Submission",
        (ActorRole::Staff | ActorRole::StaffAdmin, ApplicationStage::OfferLetter) => "Offer Sent",
        _ => stage.label(),
    }
}

/// Presentation tokens for the kanban board, keyed off the stage enum so the
/// board can never drift from the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KanbanPlacement {
    pub color_token: &'static str,
    pub background_token: &'static str,
}

pub const fn kanban_placement(stage: ApplicationStage) -> KanbanPlacement {
    let (color_token, background_token) = match stage {
        ApplicationStage::Draft => ("slate-600", "slate-50"),
        ApplicationStage::Submitted => ("sky-600", "sky-50"),
        ApplicationStage::InReview => ("amber-600", "amber-50"),
        ApplicationStage::OfferLetter => ("violet-600", "violet-50"),
        ApplicationStage::GsAssessment => ("cyan-600", "cyan-50"),
        ApplicationStage::CoeIssued => ("emerald-600", "emerald-50"),
        ApplicationStage::Accepted => ("green-700", "green-50"),
        ApplicationStage::Rejected => ("rose-600", "rose-50"),
    };

    KanbanPlacement {
        color_token,
        background_token,
    }
}

/// Per-section Galaxy propagation record.
///
/// Created server-side on the first sync attempt and updated on every attempt
/// afterwards, success or failure; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub attempt_count: u32,
    pub uptodate: bool,
}

impl SyncStatus {
    pub fn succeeded(at: DateTime<Utc>, previous_attempts: u32) -> Self {
        Self {
            last_synced_at: Some(at),
            last_error: None,
            attempt_count: previous_attempts + 1,
            uptodate: true,
        }
    }

    pub fn failed(error: String, previous: Option<&SyncStatus>) -> Self {
        Self {
            last_synced_at: previous.and_then(|status| status.last_synced_at),
            last_error: Some(error),
            attempt_count: previous.map(|status| status.attempt_count).unwrap_or(0) + 1,
            uptodate: false,
        }
    }
}

/// Map of section name to its sync record; `None` marks a section the backend
/// knows about but has never attempted to propagate.
pub type SyncMetadata = BTreeMap<String, Option<SyncStatus>>;

/// Data sections an application carries, with their Galaxy endpoint paths.
pub const KNOWN_SECTIONS: [(&str, &str); 5] = [
    ("personal_details", "personal-details"),
    ("enrollment_data", "enrollment"),
    ("documents", "documents"),
    ("education_history", "education-history"),
    ("test_scores", "test-scores"),
];

pub fn galaxy_path_for(section: &str) -> Option<&'static str> {
    KNOWN_SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, path)| *path)
}
