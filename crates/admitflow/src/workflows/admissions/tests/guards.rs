use crate::workflows::admissions::domain::{
    display_label, kanban_placement, ActorRole, ApplicationStage,
};
use crate::workflows::admissions::guards::{TransitionGuard, TransitionRefusal};
use crate::workflows::admissions::sync::SyncReport;

fn incomplete_sync() -> SyncReport {
    SyncReport {
        failing_sections: vec!["enrollment_data".to_string()],
    }
}

#[test]
fn forward_only_holds_for_staff_with_complete_sync() {
    for (from_index, from) in ApplicationStage::ordered().iter().enumerate() {
        for (to_index, to) in ApplicationStage::ordered().iter().enumerate() {
            let allowed = TransitionGuard::can_advance(*from, *to, ActorRole::Staff, true);
            assert_eq!(
                allowed,
                to_index >= from_index,
                "stage {} -> {} should be {}",
                from.as_str(),
                to.as_str(),
                to_index >= from_index,
            );
        }
    }
}

#[test]
fn rejected_is_reachable_from_review_onward_only() {
    let review_onward = [
        ApplicationStage::InReview,
        ApplicationStage::OfferLetter,
        ApplicationStage::GsAssessment,
        ApplicationStage::CoeIssued,
    ];
    for stage in review_onward {
        assert!(TransitionGuard::can_advance(
            stage,
            ApplicationStage::Rejected,
            ActorRole::Staff,
            true
        ));
    }

    for stage in [ApplicationStage::Draft, ApplicationStage::Submitted] {
        let refusal = TransitionGuard::authorize(
            stage,
            ApplicationStage::Rejected,
            ActorRole::Staff,
            &SyncReport::complete(),
        )
        .expect_err("rejection before review must refuse");
        assert!(matches!(
            refusal,
            TransitionRefusal::RejectionBeforeReview { .. }
        ));
    }
}

#[test]
fn terminal_stages_admit_no_further_transitions() {
    for terminal in [ApplicationStage::Accepted, ApplicationStage::Rejected] {
        for target in ApplicationStage::ordered() {
            if target == terminal {
                continue;
            }
            assert!(
                !TransitionGuard::can_advance(terminal, target, ActorRole::Staff, true),
                "terminal {} must not reach {}",
                terminal.as_str(),
                target.as_str(),
            );
        }
    }
}

#[test]
fn agents_cannot_move_submitted_applications() {
    for role in [ActorRole::Agent, ActorRole::Student] {
        assert!(!TransitionGuard::can_advance(
            ApplicationStage::Submitted,
            ApplicationStage::InReview,
            role,
            true
        ));
        assert!(!TransitionGuard::can_advance(
            ApplicationStage::InReview,
            ApplicationStage::Rejected,
            role,
            true
        ));
    }

    // Agents still submit their own drafts.
    assert!(TransitionGuard::can_advance(
        ApplicationStage::Draft,
        ApplicationStage::Submitted,
        ActorRole::Agent,
        true
    ));
}

#[test]
fn offer_and_acceptance_are_sync_gated() {
    for target in [ApplicationStage::OfferLetter, ApplicationStage::Accepted] {
        let refusal = TransitionGuard::authorize(
            ApplicationStage::InReview,
            target,
            ActorRole::Staff,
            &incomplete_sync(),
        )
        .expect_err("sync-gated transition must refuse");

        match refusal {
            TransitionRefusal::SyncIncomplete { pending_sections } => {
                assert_eq!(pending_sections, vec!["enrollment_data".to_string()]);
            }
            other => panic!("expected sync refusal, got {other:?}"),
        }
    }

    // Resending an offer while already at the offer stage is still gated.
    assert!(!TransitionGuard::can_advance(
        ApplicationStage::OfferLetter,
        ApplicationStage::OfferLetter,
        ActorRole::Staff,
        false
    ));
}

#[test]
fn rejection_reason_bounds_are_inclusive() {
    assert!(TransitionGuard::validate_rejection_reason(&"x".repeat(9)).is_err());
    assert!(TransitionGuard::validate_rejection_reason(&"x".repeat(10)).is_ok());
    assert!(TransitionGuard::validate_rejection_reason(&"x".repeat(1000)).is_ok());
    assert!(TransitionGuard::validate_rejection_reason(&"x".repeat(1001)).is_err());
}

#[test]
fn archive_refused_only_for_rejected() {
    for stage in ApplicationStage::ordered() {
        assert!(TransitionGuard::authorize_archive(stage, ActorRole::Staff).is_ok());
    }
    assert!(matches!(
        TransitionGuard::authorize_archive(ApplicationStage::Rejected, ActorRole::Staff),
        Err(TransitionRefusal::ArchiveForbidden { .. })
    ));
    assert!(matches!(
        TransitionGuard::authorize_archive(ApplicationStage::Draft, ActorRole::Student),
        Err(TransitionRefusal::RoleForbidden { .. })
    ));
}

#[test]
fn assignment_requires_staff_admin() {
    assert!(TransitionGuard::authorize_assignment(ActorRole::StaffAdmin).is_ok());
    for role in [ActorRole::Staff, ActorRole::Agent, ActorRole::Student] {
        assert!(matches!(
            TransitionGuard::authorize_assignment(role),
            Err(TransitionRefusal::AssignmentForbidden { .. })
        ));
    }
}

#[test]
fn unknown_stage_strings_fail_closed_to_draft() {
    assert_eq!(
        ApplicationStage::parse("totally_new_stage"),
        ApplicationStage::Draft
    );
    assert_eq!(
        ApplicationStage::parse("coe_issued_accepted"),
        ApplicationStage::Accepted
    );
    assert_eq!(
        ApplicationStage::parse(" In_Review "),
        ApplicationStage::InReview
    );
}

#[test]
fn labels_fall_back_to_generic_wording() {
    assert_eq!(
        display_label(ApplicationStage::OfferLetter, ActorRole::Agent),
        "Offer Received"
    );
    assert_eq!(
        display_label(ApplicationStage::OfferLetter, ActorRole::Staff),
        "Offer Sent"
    );
    assert_eq!(
        display_label(ApplicationStage::OfferLetter, ActorRole::Student),
        "Offer Letter"
    );
    assert_eq!(
        display_label(ApplicationStage::Draft, ActorRole::Agent),
        "Draft"
    );
}

#[test]
fn kanban_placement_is_stable_per_stage() {
    let mut seen = std::collections::BTreeSet::new();
    for stage in ApplicationStage::ordered() {
        let placement = kanban_placement(stage);
        assert!(
            seen.insert(placement.color_token),
            "duplicate color token for {}",
            stage.as_str()
        );
    }
    assert_eq!(kanban_placement(ApplicationStage::Rejected).color_token, "rose-600");
}
