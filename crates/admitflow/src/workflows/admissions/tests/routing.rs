use super::common::*;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::admissions::domain::ApplicationStage;
use crate::workflows::admissions::router::admissions_router;

async fn post_json(
    router: axum::Router,
    uri: &str,
    payload: serde_json::Value,
) -> axum::response::Response {
    router
        .oneshot(
            axum::http::Request::post(uri)
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&payload).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes")
}

#[tokio::test]
async fn create_route_returns_created_view() {
    let (service, _, _) = build_service();
    let router = admissions_router(Arc::new(service));

    let response = post_json(
        router,
        "/api/v1/admissions/applications",
        json!({ "student_id": "stu-1" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stage"], json!("draft"));
    assert!(payload["application_id"].as_str().is_some());
}

#[tokio::test]
async fn advance_route_maps_refusals_to_unprocessable_entity() {
    let (service, repository, _) = build_service();
    let record = service.create_draft(None, None).expect("draft created");
    force_stage(&repository, &record, ApplicationStage::InReview);

    let mut blocked = repository
        .fetch(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    blocked
        .sync_metadata
        .insert("documents".to_string(), Some(stale_status()));
    repository
        .update(blocked)
        .expect("metadata update succeeds");

    let router = admissions_router(Arc::new(service));
    let response = post_json(
        router,
        &format!("/api/v1/admissions/applications/{}/advance", record.id.0),
        json!({ "to_stage": "offer_letter", "role": "staff" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["sync_required"], json!(true));
    assert_eq!(payload["pending_sections"], json!(["documents"]));
}

#[tokio::test]
async fn reject_route_enforces_reason_bounds() {
    let (service, repository, _) = build_service();
    let record = service.create_draft(None, None).expect("draft created");
    force_stage(&repository, &record, ApplicationStage::InReview);

    let router = admissions_router(Arc::new(service));
    let uri = format!("/api/v1/admissions/applications/{}/reject", record.id.0);

    let response = post_json(
        router.clone(),
        &uri,
        json!({ "reason": "too brief", "role": "staff" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json(
        router,
        &uri,
        json!({ "reason": "Program intake closed for this semester.", "role": "staff" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stage"], json!("rejected"));
}

#[tokio::test]
async fn status_route_reports_not_found() {
    let (service, _, _) = build_service();
    let router = admissions_router(Arc::new(service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/admissions/applications/app-999999")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_route_honors_requested_role_wording() {
    let (service, repository, _) = build_service();
    let record = service.create_draft(None, None).expect("draft created");
    force_stage(&repository, &record, ApplicationStage::OfferLetter);

    let router = admissions_router(Arc::new(service));
    let response = router
        .oneshot(
            axum::http::Request::get(format!(
                "/api/v1/admissions/applications/{}?role=agent",
                record.id.0
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stage_label"], json!("Offer Received"));
}

#[tokio::test]
async fn sync_route_surfaces_gateway_failures_as_bad_gateway() {
    let (service, _, galaxy) = build_service();
    let record = service.create_draft(None, None).expect("draft created");
    galaxy.fail_section("documents");

    let router = admissions_router(Arc::new(service));
    let response = post_json(
        router,
        &format!(
            "/api/v1/admissions/applications/{}/sync/documents",
            record.id.0
        ),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("connection reset"));
}

#[tokio::test]
async fn sync_report_route_enumerates_failing_sections() {
    let (service, _, galaxy) = build_service();
    let record = service.create_draft(None, None).expect("draft created");

    galaxy.fail_section("enrollment_data");
    service
        .sync_section(&record.id, "personal_details")
        .await
        .expect("personal details syncs");
    service
        .sync_section(&record.id, "enrollment_data")
        .await
        .expect("enrollment failure is recorded");

    let router = admissions_router(Arc::new(service));
    let response = router
        .oneshot(
            axum::http::Request::get(format!(
                "/api/v1/admissions/applications/{}/sync",
                record.id.0
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["complete"], json!(false));
    assert_eq!(payload["failing_sections"], json!(["enrollment_data"]));
}
