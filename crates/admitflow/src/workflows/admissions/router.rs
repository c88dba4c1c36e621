use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ActorRole, ApplicationId, ApplicationStage, StaffId};
use super::galaxy::GalaxyGateway;
use super::guards::TransitionRefusal;
use super::listing::{ListFilters, PageRequest};
use super::repository::{ApplicationRepository, RepositoryError};
use super::service::{AdmissionsService, AdmissionsServiceError, SyncOutcome};

/// Router builder exposing HTTP endpoints for the admissions lifecycle.
pub fn admissions_router<R, G>(service: Arc<AdmissionsService<R, G>>) -> Router
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/applications",
            post(create_handler::<R, G>).get(list_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(status_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/advance",
            post(advance_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/reject",
            post(reject_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/assign",
            post(assign_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/archive",
            post(archive_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/sync",
            get(sync_report_handler::<R, G>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/sync/:section",
            post(sync_section_handler::<R, G>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRequest {
    #[serde(default)]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub(crate) to_stage: ApplicationStage,
    pub(crate) role: ActorRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    pub(crate) reason: String,
    pub(crate) role: ActorRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    pub(crate) staff_id: Option<String>,
    pub(crate) role: ActorRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveRequest {
    pub(crate) archived: bool,
    pub(crate) role: ActorRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) page: Option<u32>,
    #[serde(default)]
    pub(crate) per_page: Option<u32>,
    #[serde(default)]
    pub(crate) role: Option<ActorRole>,
    #[serde(default)]
    pub(crate) stage: Option<ApplicationStage>,
    #[serde(default)]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) agent_id: Option<String>,
    #[serde(default)]
    pub(crate) staff_id: Option<String>,
    #[serde(default)]
    pub(crate) submitted_from: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub(crate) submitted_to: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) include_archived: bool,
}

impl ListQuery {
    fn filters(&self) -> ListFilters {
        ListFilters {
            stage: self.stage,
            student_id: self.student_id.clone(),
            agent_id: self.agent_id.clone(),
            staff_id: self.staff_id.clone(),
            submitted_from: self.submitted_from,
            submitted_to: self.submitted_to,
            search: self.search.clone(),
            include_archived: self.include_archived,
        }
    }
}

pub(crate) async fn create_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    axum::Json(request): axum::Json<CreateRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    match service.create_draft(request.student_id, request.agent_id) {
        Ok(record) => {
            let view = record.status_view(ActorRole::Staff);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path(application_id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.get(&id) {
        Ok(record) => {
            let view = record.status_view(query.role.unwrap_or(ActorRole::Staff));
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleQuery {
    #[serde(default)]
    pub(crate) role: Option<ActorRole>,
}

pub(crate) async fn list_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(25),
    };
    let role = query.role.unwrap_or(ActorRole::Staff);
    let filters = query.filters();

    match service.list(&filters, &page) {
        Ok(records) => {
            let views: Vec<_> = records
                .iter()
                .map(|record| record.status_view(role))
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<AdvanceRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.advance(&id, request.to_stage, request.role) {
        Ok(record) => {
            let view = record.status_view(request.role);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<RejectRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.reject(&id, &request.reason, request.role) {
        Ok(record) => {
            let view = record.status_view(request.role);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assign_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<AssignRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    let staff_id = request.staff_id.map(StaffId);
    match service.assign_staff(&id, staff_id, request.role) {
        Ok(record) => {
            let view = record.status_view(request.role);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn archive_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ArchiveRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.set_archived(&id, request.archived, request.role) {
        Ok(record) => {
            let view = record.status_view(request.role);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sync_report_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.sync_report(&id) {
        Ok(report) => {
            let payload = json!({
                "complete": report.is_complete(),
                "failing_sections": report.failing_sections,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sync_section_handler<R, G>(
    State(service): State<Arc<AdmissionsService<R, G>>>,
    Path((application_id, section)): Path<(String, String)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: GalaxyGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.sync_section(&id, &section).await {
        Ok(SyncOutcome::Synced { status }) => {
            let payload = json!({ "section": section, "status": status });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(SyncOutcome::Failed { error }) => {
            let payload = json!({ "section": section, "error": error });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Map service errors onto HTTP statuses, keeping pre-flight refusals
/// distinguishable from backend failures.
fn error_response(err: AdmissionsServiceError) -> Response {
    match err {
        AdmissionsServiceError::Refused(refusal) => {
            let mut payload = json!({ "error": refusal.to_string() });
            if let TransitionRefusal::SyncIncomplete { pending_sections } = &refusal {
                payload["sync_required"] = json!(true);
                payload["pending_sections"] = json!(pending_sections);
            }
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        AdmissionsServiceError::UnknownSection(section) => {
            let payload = json!({ "error": format!("unknown section '{section}'") });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        AdmissionsServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "application not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        AdmissionsServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "application already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
