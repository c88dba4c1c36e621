use super::domain::{ActorRole, ApplicationStage};
use super::sync::SyncReport;

pub const REJECTION_REASON_MIN_CHARS: usize = 10;
pub const REJECTION_REASON_MAX_CHARS: usize = 1000;

/// Reasons a lifecycle action is refused before any network call.
///
/// These are pre-flight, local decisions; they must stay distinguishable from
/// backend-side rejections, which surface as repository or gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionRefusal {
    #[error("stage {} is terminal; no further transitions", .current.label())]
    TerminalStage { current: ApplicationStage },
    #[error("cannot move backwards from {} to {}", .current.label(), .target.label())]
    BackwardMove {
        current: ApplicationStage,
        target: ApplicationStage,
    },
    #[error("rejection is only available once an application reaches review")]
    RejectionBeforeReview { current: ApplicationStage },
    #[error("role {} may not perform this transition", .role.label())]
    RoleForbidden { role: ActorRole },
    #[error("assignment changes require the staff-admin role")]
    AssignmentForbidden { role: ActorRole },
    #[error("Galaxy sync incomplete; sections pending: {}", .pending_sections.join(", "))]
    SyncIncomplete { pending_sections: Vec<String> },
    #[error(
        "rejection reason must be between {REJECTION_REASON_MIN_CHARS} and \
         {REJECTION_REASON_MAX_CHARS} characters (got {length})"
    )]
    ReasonOutOfBounds { length: usize },
    #[error("archived state cannot change on a rejected application")]
    ArchiveForbidden { current: ApplicationStage },
}

/// Stage-transition guard predicates.
///
/// All checks are pure; callers fetch the sync snapshot and evaluate it with
/// [`super::sync::evaluate`] before asking for authorization.
pub struct TransitionGuard;

impl TransitionGuard {
    /// Authorize a stage transition, reporting the first refusal encountered.
    ///
    /// Check order is ordering, then role, then sync, so a caller showing a
    /// single refusal shows the most fundamental one.
    pub fn authorize(
        current: ApplicationStage,
        target: ApplicationStage,
        role: ActorRole,
        sync: &SyncReport,
    ) -> Result<(), TransitionRefusal> {
        Self::check_ordering(current, target)?;
        Self::check_role(current, target, role)?;
        Self::check_sync(target, sync)?;
        Ok(())
    }

    /// Boolean convenience over [`TransitionGuard::authorize`].
    pub fn can_advance(
        current: ApplicationStage,
        target: ApplicationStage,
        role: ActorRole,
        sync_complete: bool,
    ) -> bool {
        let sync = if sync_complete {
            SyncReport::complete()
        } else {
            SyncReport {
                failing_sections: vec!["unknown".to_string()],
            }
        };
        Self::authorize(current, target, role, &sync).is_ok()
    }

    fn check_ordering(
        current: ApplicationStage,
        target: ApplicationStage,
    ) -> Result<(), TransitionRefusal> {
        if current == ApplicationStage::Rejected
            || (current.is_terminal() && current != target)
        {
            return Err(TransitionRefusal::TerminalStage { current });
        }

        if target == ApplicationStage::Rejected {
            // Alternate terminal branch: reachable from review onward only.
            return match current {
                ApplicationStage::InReview
                | ApplicationStage::OfferLetter
                | ApplicationStage::GsAssessment
                | ApplicationStage::CoeIssued => Ok(()),
                _ => Err(TransitionRefusal::RejectionBeforeReview { current }),
            };
        }

        match (current.index(), target.index()) {
            (Some(from), Some(to)) if to >= from => Ok(()),
            _ => Err(TransitionRefusal::BackwardMove { current, target }),
        }
    }

    fn check_role(
        current: ApplicationStage,
        target: ApplicationStage,
        role: ActorRole,
    ) -> Result<(), TransitionRefusal> {
        let leaving_review_queue = matches!(
            current,
            ApplicationStage::Submitted | ApplicationStage::InReview
        ) && current != target;
        let entering_terminal = target.is_terminal() && current != target;

        if (leaving_review_queue || entering_terminal) && !role.is_staff() {
            return Err(TransitionRefusal::RoleForbidden { role });
        }

        Ok(())
    }

    fn check_sync(
        target: ApplicationStage,
        sync: &SyncReport,
    ) -> Result<(), TransitionRefusal> {
        let sync_gated = matches!(
            target,
            ApplicationStage::OfferLetter | ApplicationStage::Accepted
        );

        if sync_gated && !sync.is_complete() {
            return Err(TransitionRefusal::SyncIncomplete {
                pending_sections: sync.failing_sections.clone(),
            });
        }

        Ok(())
    }

    /// Validate a rejection reason before anything leaves the process.
    pub fn validate_rejection_reason(reason: &str) -> Result<(), TransitionRefusal> {
        let length = reason.chars().count();
        if (REJECTION_REASON_MIN_CHARS..=REJECTION_REASON_MAX_CHARS).contains(&length) {
            Ok(())
        } else {
            Err(TransitionRefusal::ReasonOutOfBounds { length })
        }
    }

    /// Archiving is orthogonal to the stage machine and reversible; only the
    /// rejected terminal refuses it.
    pub fn authorize_archive(
        current: ApplicationStage,
        role: ActorRole,
    ) -> Result<(), TransitionRefusal> {
        if current == ApplicationStage::Rejected {
            return Err(TransitionRefusal::ArchiveForbidden { current });
        }

        if !(role.is_staff() || role == ActorRole::Agent) {
            return Err(TransitionRefusal::RoleForbidden { role });
        }

        Ok(())
    }

    /// Assignment is staff-admin specific, independent of stage ordering.
    pub fn authorize_assignment(role: ActorRole) -> Result<(), TransitionRefusal> {
        if role == ActorRole::StaffAdmin {
            Ok(())
        } else {
            Err(TransitionRefusal::AssignmentForbidden { role })
        }
    }
}
