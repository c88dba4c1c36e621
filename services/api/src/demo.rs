use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use serde_json::json;

use crate::infra::{
    default_sync_policy, InMemoryApplicationRepository, InMemoryDocumentStore,
    InMemoryGalaxyGateway, ScriptedExtractionGateway,
};
use admitflow::error::AppError;
use admitflow::workflows::admissions::{
    display_label, kanban_placement, ActorRole, AdmissionsService, ApplicationRepository,
    ApplicationStage, KNOWN_SECTIONS,
};
use admitflow::workflows::autofill::{
    AutofillEngine, AutofillOutcome, DocumentGateway, ExtractionMetadata, ExtractionSnapshot,
    FormPersistenceBridge, OcrSection, OneOrMany, PollPlan, SectionMapper, StepDataStore,
    UploadRequest,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Student display name used in the transcript
    #[arg(long, default_value = "Ananya Rao")]
    pub(crate) applicant: String,
    /// Skip the document upload and OCR autofill portion of the demo
    #[arg(long)]
    pub(crate) skip_autofill: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applicant,
        skip_autofill,
    } = args;

    println!("Admissions lifecycle demo");

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let galaxy = Arc::new(InMemoryGalaxyGateway::default());
    let service = Arc::new(AdmissionsService::new(
        repository.clone(),
        galaxy.clone(),
        default_sync_policy(),
    ));

    let record = match service.create_draft(Some("stu-2041".to_string()), Some("agt-11".to_string()))
    {
        Ok(record) => record,
        Err(err) => {
            println!("  Draft creation failed: {}", err);
            return Ok(());
        }
    };
    println!(
        "- Opened application {} for {} -> stage {}",
        record.id.0,
        applicant,
        record.stage.label()
    );

    let mut store = StepDataStore::new();

    if !skip_autofill {
        run_autofill_portion(&record.id, &mut store).await;
    }

    // The applicant finishes the personal-details step by hand.
    let mut bridge = FormPersistenceBridge::new(record.id.clone(), 1, Duration::from_millis(500));
    let now = Instant::now();
    bridge.record_change(
        json!({ "given_name": "Ananya", "surname": "Rao" })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        now,
    );
    bridge.flush(&mut store);
    println!(
        "- Step 1 draft saved; merged view now {}",
        serde_json::Value::Object(store.merged_view(1))
    );

    for (from, to, role) in [
        (ApplicationStage::Draft, ApplicationStage::Submitted, ActorRole::Agent),
        (ApplicationStage::Submitted, ApplicationStage::InReview, ActorRole::Staff),
    ] {
        match service.advance(&record.id, to, role) {
            Ok(_) => println!(
                "- {} moved {} -> {}",
                role.label(),
                from.label(),
                to.label()
            ),
            Err(err) => {
                println!("  Transition refused: {}", err);
                return Ok(());
            }
        }
    }

    // An offer cannot go out while Galaxy has never seen the sections.
    let mut unsynced = match repository_record(&service, &record.id) {
        Some(record) => record,
        None => return Ok(()),
    };
    unsynced
        .sync_metadata
        .insert("personal_details".to_string(), None);
    if let Err(err) = repository.update(unsynced) {
        println!("  Repository unavailable: {}", err);
        return Ok(());
    }
    match service.advance(&record.id, ApplicationStage::OfferLetter, ActorRole::Staff) {
        Err(err) => println!("- Offer blocked as expected: {}", err),
        Ok(_) => println!("  (offer unexpectedly allowed before sync)"),
    }

    println!("- Propagating sections to Galaxy");
    for (section, _) in KNOWN_SECTIONS {
        match service.sync_section(&record.id, section).await {
            Ok(outcome) => println!("    {section}: {outcome:?}"),
            Err(err) => println!("    {section}: {err}"),
        }
    }
    match service.sync_report(&record.id) {
        Ok(report) => println!("- Sync report complete: {}", report.is_complete()),
        Err(err) => println!("  Sync report unavailable: {}", err),
    }

    for to in [
        ApplicationStage::OfferLetter,
        ApplicationStage::GsAssessment,
        ApplicationStage::CoeIssued,
        ApplicationStage::Accepted,
    ] {
        match service.advance(&record.id, to, ActorRole::Staff) {
            Ok(updated) => {
                let placement = kanban_placement(updated.stage);
                println!(
                    "- Stage {} | agent sees \"{}\" | kanban {}",
                    updated.stage.label(),
                    display_label(updated.stage, ActorRole::Agent),
                    placement.color_token
                );
            }
            Err(err) => {
                println!("  Transition refused: {}", err);
                return Ok(());
            }
        }
    }

    // Rejection reasons are validated before anything leaves the process.
    match service.reject(&record.id, "too short", ActorRole::Staff) {
        Err(err) => println!("- Late rejection refused: {}", err),
        Ok(_) => println!("  (rejection unexpectedly allowed)"),
    }

    println!(
        "- Galaxy received {} section syncs in total",
        galaxy.calls().len()
    );

    Ok(())
}

async fn run_autofill_portion(
    application_id: &admitflow::workflows::admissions::ApplicationId,
    store: &mut StepDataStore,
) {
    let documents = InMemoryDocumentStore::default();
    let upload = documents
        .upload(UploadRequest {
            application_id: application_id.clone(),
            document_type_id: "passport".to_string(),
            file_name: "passport.pdf".to_string(),
            bytes: b"%PDF-1.7 demo".to_vec(),
            process_ocr: true,
        })
        .await;
    match upload {
        Ok(receipt) => println!("- Uploaded passport -> {}", receipt.document_id),
        Err(err) => {
            println!("  Upload failed: {}", err);
            return;
        }
    }

    let section = OcrSection {
        source_document_id: "doc-0001".to_string(),
        document_type: "passport".to_string(),
        extracted_data: json!({
            "given_name": "Ananya",
            "gender": "F",
            "passport_number": "N7713392",
            "expiry_date": "2031-08-02"
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
        confidence_scores: Default::default(),
    };
    let mut sections = std::collections::BTreeMap::new();
    sections.insert("passport".to_string(), OneOrMany::One(section));

    let extraction = ScriptedExtractionGateway::new(vec![
        Ok(ExtractionSnapshot {
            sections: Default::default(),
            metadata: ExtractionMetadata { ocr_pending: 1 },
        }),
        Ok(ExtractionSnapshot {
            sections,
            metadata: ExtractionMetadata { ocr_pending: 0 },
        }),
    ]);

    let engine = AutofillEngine::new(
        extraction,
        SectionMapper::standard(),
        PollPlan {
            interval: Duration::from_millis(50),
            max_attempts: 5,
        },
    );

    match engine.run(application_id, store).await {
        AutofillOutcome::Populated { fields } => {
            println!("- OCR autofill populated {fields} empty fields");
        }
        AutofillOutcome::NoFields => println!("- OCR finished with no usable fields"),
        AutofillOutcome::TimedOut => println!("- OCR is taking longer than expected"),
        AutofillOutcome::Failed(err) => println!("- OCR autofill failed: {err}"),
    }
}

fn repository_record(
    service: &AdmissionsService<InMemoryApplicationRepository, InMemoryGalaxyGateway>,
    id: &admitflow::workflows::admissions::ApplicationId,
) -> Option<admitflow::workflows::admissions::ApplicationRecord> {
    match service.get(id) {
        Ok(record) => Some(record),
        Err(err) => {
            println!("  Application lookup failed: {}", err);
            None
        }
    }
}
