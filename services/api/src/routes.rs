use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use admitflow::workflows::admissions::{
    admissions_router, AdmissionsService, ApplicationId, ApplicationRepository, GalaxyGateway,
};
use admitflow::workflows::autofill::{
    AutofillEngine, AutofillOutcome, SectionMapper, StepDataStore, UploadError, UploadRequest,
};

pub(crate) fn with_service_routes<R, G>(service: Arc<AdmissionsService<R, G>>) -> axum::Router
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    admissions_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/admissions/applications/:application_id/autofill",
            axum::routing::post(autofill_endpoint),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/steps/:step",
            axum::routing::get(step_view_endpoint).put(step_write_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct AutofillRequest {
    pub(crate) document_type_id: String,
    pub(crate) file_name: String,
    pub(crate) content: String,
    #[serde(default = "default_process_ocr")]
    pub(crate) process_ocr: bool,
}

fn default_process_ocr() -> bool {
    true
}

/// Upload a document and, when OCR is requested, poll extraction to
/// completion and merge the result into the application's step data.
pub(crate) async fn autofill_endpoint(
    Extension(state): Extension<AppState>,
    Path(application_id): Path<String>,
    Json(request): Json<AutofillRequest>,
) -> impl IntoResponse {
    let application_id = ApplicationId(application_id);
    let upload = UploadRequest {
        application_id: application_id.clone(),
        document_type_id: request.document_type_id,
        file_name: request.file_name,
        bytes: request.content.into_bytes(),
        process_ocr: request.process_ocr,
    };

    let receipt = match state.documents.upload(upload).await {
        Ok(receipt) => receipt,
        // Upload failure is terminal: report immediately, start no polling.
        Err(UploadError::Rejected { status, detail }) => {
            let payload = json!({ "error": format!("upload rejected (status {status}): {detail}") });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
        Err(UploadError::Transport(detail)) => {
            let payload = json!({ "error": format!("upload transport failure: {detail}") });
            return (StatusCode::BAD_GATEWAY, Json(payload)).into_response();
        }
    };

    if !request.process_ocr {
        let payload = json!({ "document_id": receipt.document_id });
        return (StatusCode::ACCEPTED, Json(payload)).into_response();
    }

    let engine = AutofillEngine::new(
        state.extraction.clone(),
        SectionMapper::standard(),
        state.poll_plan,
    );

    // Take the store out of the session map so the lock is not held across
    // the polling awaits.
    let mut store = {
        let mut steps = state.steps.lock().expect("step map mutex poisoned");
        steps.remove(&application_id).unwrap_or_default()
    };
    let outcome = engine.run(&application_id, &mut store).await;
    {
        let mut steps = state.steps.lock().expect("step map mutex poisoned");
        steps.insert(application_id.clone(), store);
    }

    match outcome {
        AutofillOutcome::Populated { fields } => {
            let payload = json!({
                "document_id": receipt.document_id,
                "outcome": "populated",
                "fields_populated": fields,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        AutofillOutcome::NoFields => {
            let payload = json!({
                "document_id": receipt.document_id,
                "outcome": "no_fields",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        AutofillOutcome::TimedOut => {
            let payload = json!({
                "document_id": receipt.document_id,
                "outcome": "timed_out",
                "detail": "document processing is taking longer than expected",
            });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        AutofillOutcome::Failed(error) => {
            let payload = json!({
                "document_id": receipt.document_id,
                "outcome": "failed",
                "error": error.to_string(),
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn step_view_endpoint(
    Extension(state): Extension<AppState>,
    Path((application_id, step)): Path<(String, u32)>,
) -> impl IntoResponse {
    let application_id = ApplicationId(application_id);
    let mut steps = state.steps.lock().expect("step map mutex poisoned");
    let store = steps
        .entry(application_id.clone())
        .or_insert_with(StepDataStore::new);
    store.activate(&application_id);

    let payload = json!({
        "application_id": application_id.0,
        "step": step,
        "values": Value::Object(store.merged_view(step)),
    });
    (StatusCode::OK, Json(payload))
}

pub(crate) async fn step_write_endpoint(
    Extension(state): Extension<AppState>,
    Path((application_id, step)): Path<(String, u32)>,
    Json(values): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let application_id = ApplicationId(application_id);
    let mut steps = state.steps.lock().expect("step map mutex poisoned");
    let store = steps
        .entry(application_id.clone())
        .or_insert_with(StepDataStore::new);
    store.activate(&application_id);
    store.write_user_fields(step, values);

    let payload = json!({
        "application_id": application_id.0,
        "step": step,
        "values": Value::Object(store.merged_view(step)),
    });
    (StatusCode::OK, Json(payload))
}
