//! Integration tests for the routes that proxy the remote services, with
//! the remote side faked by wiremock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use takeoff_core::error::CoreError;
use takeoff_core::job::JobStatus;
use takeoff_core::pricebook::{PriceBook, PriceBookStore, PriceUpdate};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    body_json, build_test_app, build_test_app_with_timeout, delete, get, post_json, test_state,
    test_state_with_bundles, WEBHOOK_URL,
};

const MODEL_URN: &str = "urn%3Aadsk.objects%3Aos.object%3Awip.dm.prod%2Fmodel.rvt";

fn asset(i: usize) -> serde_json::Value {
    json!({
        "clientAssetId": format!("A-{i}"),
        "categoryId": "10",
        "statusId": "20",
        "description": "Supply diffuser",
    })
}

// ---------------------------------------------------------------------------
// Test: submitting an extraction returns the workitem and wires callbacks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_assets_returns_workitem_and_callbacks_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/da/us-east/v3/workitems"))
        .and(body_partial_json(json!({ "activityId": "acme.ExtractAssetsActivity+dev" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wi-42", "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server.uri());
    let mut events = state.notifications.subscribe();

    let response = post_json(
        build_test_app(state.clone()),
        &format!("/api/forge/da4revit/revit/{MODEL_URN}/assets"),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["workItemId"], "wi-42");
    assert_eq!(json["data"]["workItemStatus"], "pending");

    // The workitem was told to call back under one key; play its part.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["arguments"]["inputFile"]["url"],
        format!("{}/oss/v2/buckets/wip.dm.prod/objects/model.rvt", server.uri())
    );
    let output_url = body["arguments"]["outputJson"]["url"].as_str().unwrap();
    let complete_url = body["arguments"]["onComplete"]["url"].as_str().unwrap();
    let output_path = output_url.strip_prefix(WEBHOOK_URL).unwrap();
    let complete_path = complete_url.strip_prefix(WEBHOOK_URL).unwrap();

    let result = json!({ "Workitem": "wi-42", "AssetList": [] });
    let uploaded = common::put_json(build_test_app(state.clone()), output_path, result.clone()).await;
    assert_eq!(uploaded.status(), StatusCode::OK);
    post_json(
        build_test_app(state),
        complete_path,
        json!({ "id": "wi-42", "status": "success" }),
    )
    .await;

    let event = events.recv().await.unwrap();
    assert_eq!(event.notification.job_id.as_str(), "wi-42");
    assert_eq!(event.status(), JobStatus::Completed);
    assert_eq!(event.notification.extra_info, Some(result));
}

// ---------------------------------------------------------------------------
// Test: quantity take-off uses its own activity and default parameters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_qto_uses_qto_activity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/da/us-east/v3/workitems"))
        .and(body_partial_json(json!({ "activityId": "acme.RevitQtoActivity+dev" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wi-7", "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = post_json(
        build_test_app(test_state(&server.uri())),
        &format!("/api/forge/da4revit/revit/{MODEL_URN}/qto"),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["data"]["workItemId"], "wi-7");
}

// ---------------------------------------------------------------------------
// Test: a target that is not a storage URN is rejected without a remote call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_rejects_non_storage_target() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = post_json(
        build_test_app(test_state(&server.uri())),
        "/api/forge/da4revit/revit/not-a-urn/assets",
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: categories are listed through the envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bim360/assets/v1/projects/p1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 1, "name": "Root" }, { "id": 2, "name": "Air Terminals", "parentId": 1 }]
        })))
        .mount(&server)
        .await;

    let response = get(
        build_test_app(test_state(&server.uri())),
        "/api/forge/bim360/projects/p1/categories",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][1]["id"], "2");
    assert_eq!(json["data"][1]["parentId"], "1");
}

// ---------------------------------------------------------------------------
// Test: creating a category answers 201
// ---------------------------------------------------------------------------

#[tokio::test]
async fn creates_category() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bim360/assets/v1/projects/p1/categories"))
        .and(body_partial_json(json!({ "parentId": "1", "name": "Diffusers" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "name": "Diffusers", "parentId": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = post_json(
        build_test_app(test_state(&server.uri())),
        "/api/forge/bim360/projects/p1/categories",
        json!({ "parentId": "1", "name": "Diffusers" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["id"], "9");
}

// ---------------------------------------------------------------------------
// Test: 150 assets become two batch calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_create_chunks_by_hundred() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bim360/assets/v2/projects/p1/assets:batch-create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let data: Vec<_> = (0..150).map(asset).collect();
    let response = post_json(
        build_test_app(test_state(&server.uri())),
        "/api/forge/da4revit/bim360/assets",
        json!({ "project_id": "p1", "data": data }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["succeededCount"], 150);
    assert_eq!(json["data"]["callsIssued"], 2);
    assert!(json["data"]["failedChunkIndex"].is_null());
    assert_eq!(json["data"]["remaining"], json!([]));
}

// ---------------------------------------------------------------------------
// Test: an upstream failure stops the batch and reports what is left
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_create_reports_partial_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bim360/assets/v2/projects/p1/assets:batch-create"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad category"))
        .expect(1)
        .mount(&server)
        .await;

    let data: Vec<_> = (0..250).map(asset).collect();
    let response = post_json(
        build_test_app(test_state(&server.uri())),
        "/api/forge/da4revit/bim360/assets",
        json!({ "project_id": "p1", "data": data }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["succeededCount"], 0);
    assert_eq!(json["data"]["failedChunkIndex"], 0);
    assert_eq!(json["data"]["remaining"].as_array().unwrap().len(), 250);
    assert!(json["data"]["error"].as_str().unwrap().contains("400"));
}

// ---------------------------------------------------------------------------
// Test: budgets import forwards data and append flag
// ---------------------------------------------------------------------------

#[tokio::test]
async fn imports_budgets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cost/v1/containers/c1/budgets:import"))
        .and(body_partial_json(json!({ "append": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = post_json(
        build_test_app(test_state(&server.uri())),
        "/api/forge/da4revit/bim360/budgets",
        json!({
            "cost_container_id": "c1",
            "append": false,
            "data": [{
                "code": "0001", "name": "Concrete", "quantity": 2.0,
                "unit": "m3", "unitPrice": 100.0, "amount": 200.0
            }]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["data"][0]["name"], "Concrete");
}

// ---------------------------------------------------------------------------
// Test: remote budgets are listed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_budgets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cost/v1/containers/c1/budgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 501, "code": "0001", "name": "Concrete", "quantity": 2, "unitPrice": 110, "unit": "m3" }]
        })))
        .mount(&server)
        .await;

    let response = get(
        build_test_app(test_state(&server.uri())),
        "/api/forge/bim360/projects/c1/budgets",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], "501");
    assert_eq!(json["data"][0]["name"], "Concrete");
}

// ---------------------------------------------------------------------------
// Test: upstream errors map to 502 / 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upstream_server_error_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bim360/assets/v1/projects/p1/asset-statuses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let response = get(
        build_test_app(test_state(&server.uri())),
        "/api/forge/bim360/projects/p1/status-sets",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(json["error"], "Upstream service returned 500");
}

#[tokio::test]
async fn upstream_not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/da/us-east/v3/activities/Gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such activity"))
        .mount(&server)
        .await;

    let response = delete(
        build_test_app(test_state(&server.uri())),
        "/api/forge/designautomation/activities/Gone",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: design automation management
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_revit_engines_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/da/us-east/v3/engines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": ["Autodesk.Revit+2024", "Autodesk.AutoCAD+24", "Autodesk.Revit+2022"]
        })))
        .mount(&server)
        .await;

    let response = get(
        build_test_app(test_state(&server.uri())),
        "/api/forge/designautomation/engines",
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["data"], json!(["Autodesk.Revit+2022", "Autodesk.Revit+2024"]));
}

#[tokio::test]
async fn existing_activity_answers_ok_and_new_one_created() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/da/us-east/v3/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": ["acme.CountActivity+dev"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/da/us-east/v3/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/da/us-east/v3/activities/MeasureActivity/aliases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server.uri());

    let existing = post_json(
        build_test_app(state.clone()),
        "/api/forge/designautomation/activities",
        json!({ "fileName": "Count", "engine": "Autodesk.Revit+2024" }),
    )
    .await;
    assert_eq!(existing.status(), StatusCode::OK);
    assert_eq!(body_json(existing).await["data"]["Status"], "Existing");

    let created = post_json(
        build_test_app(state),
        "/api/forge/designautomation/activities",
        json!({ "fileName": "Measure", "engine": "Autodesk.Revit+2024" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(created).await["data"]["Activity"],
        "acme.MeasureActivity+dev"
    );
}

#[tokio::test]
async fn deletes_app_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/da/us-east/v3/appbundles/CountAppBundle"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = delete(
        build_test_app(test_state(&server.uri())),
        "/api/forge/designautomation/appbundles/CountAppBundle",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ---------------------------------------------------------------------------
// Test: app bundle packages are listed and published
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_local_app_bundle_packages() {
    let server = MockServer::start().await;
    let folder = tempfile::tempdir().unwrap();
    std::fs::write(folder.path().join("Count.zip"), b"PK").unwrap();
    std::fs::write(folder.path().join("README.md"), b"docs").unwrap();

    let response = get(
        build_test_app(test_state_with_bundles(&server.uri(), folder.path())),
        "/api/forge/designautomation/appbundles",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!(["Count.zip"]));
}

#[tokio::test]
async fn publishes_app_bundle_package() {
    let server = MockServer::start().await;
    let folder = tempfile::tempdir().unwrap();
    std::fs::write(folder.path().join("Count.zip"), b"PK-count").unwrap();
    Mock::given(method("GET"))
        .and(path("/da/us-east/v3/appbundles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/da/us-east/v3/appbundles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": 1,
            "uploadParameters": {
                "endpointURL": format!("{}/bundle-upload", server.uri()),
                "formData": { "key": "apps/acme/CountAppBundle/1" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/da/us-east/v3/appbundles/CountAppBundle/aliases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bundle-upload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = post_json(
        build_test_app(test_state_with_bundles(&server.uri(), folder.path())),
        "/api/forge/designautomation/appbundles",
        json!({ "fileName": "Count", "engine": "Autodesk.Revit+2024" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["AppBundle"], "acme.CountAppBundle+dev");
    assert_eq!(json["data"]["Version"], 1);
}

#[tokio::test]
async fn missing_app_bundle_package_is_bad_request() {
    let server = MockServer::start().await;
    let folder = tempfile::tempdir().unwrap();

    let response = post_json(
        build_test_app(test_state_with_bundles(&server.uri(), folder.path())),
        "/api/forge/designautomation/appbundles",
        json!({ "fileName": "Count", "engine": "Autodesk.Revit+2024" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: the request timeout only covers locally served routes
// ---------------------------------------------------------------------------

/// Price book whose reads take `delay`.
struct SlowPriceBook {
    delay: Duration,
}

#[async_trait]
impl PriceBookStore for SlowPriceBook {
    async fn load(&self) -> Result<PriceBook, CoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(PriceBook::seeded(3))
    }

    async fn upsert_price(&self, _update: &PriceUpdate) -> Result<(), CoreError> {
        Ok(())
    }

    async fn reset(&self, budget_code_length: u32) -> Result<PriceBook, CoreError> {
        Ok(PriceBook::seeded(budget_code_length))
    }
}

#[tokio::test]
async fn slow_upstream_outlives_the_local_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/da/us-east/v3/engines"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": ["Autodesk.Revit+2024"] }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = get(
        build_test_app_with_timeout(test_state(&server.uri()), Duration::from_millis(50)),
        "/api/forge/designautomation/engines",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn slow_local_route_times_out() {
    let mut state = test_state("http://127.0.0.1:1");
    state.price_book = Arc::new(SlowPriceBook {
        delay: Duration::from_millis(300),
    });

    let response = get(
        build_test_app_with_timeout(state, Duration::from_millis(50)),
        "/api/forge/pricebook/items",
    )
    .await;

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
