use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use serde_json::{Value, json};

use condo_billing::api::membership::MembershipReconcilers;
use condo_billing::config::Config;
use condo_billing::model::compensation::COMPENSATIONS;
use condo_billing::model::payment::PAYMENTS;
use condo_billing::{CompensationLedger, InMemoryStore, routes};

fn memory_config() -> Config {
    Config::from_lookup(|key| (key == "STORE_BACKEND").then(|| "memory".to_string()))
        .expect("memory config")
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().expect("socket address")
}

macro_rules! billing_app {
    ($store:expr) => {{
        let store = $store.clone();
        let config = memory_config();
        test::init_service(
            App::new()
                .app_data(Data::new(CompensationLedger::new(store.clone())))
                .app_data(Data::new(MembershipReconcilers::new(store)))
                .configure(|cfg| routes::configure(cfg, &config)),
        )
        .await
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.peer_addr(peer()).to_request()).await;
        let status: StatusCode = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn saving_a_compensation_writes_both_records() {
    let store = Arc::new(InMemoryStore::new());
    let app = billing_app!(store);

    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/employee/7/condominiums")
            .set_json(json!({ "condominium_ids": [42] }))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/compensation").set_json(json!({
            "employee_id": 7,
            "net_salary": "2000",
            "social_security": "300",
            "union_contribution": "100",
            "other_deductions": "0",
            "month": 3,
            "year": 2024
        }))
    );

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["compensation"]["total_compensation"], json!("2400.00"));
    assert_eq!(body["payment"]["total_amount"], json!("2400.00"));
    assert_eq!(body["payment"]["status"], json!("paid"));
    assert_eq!(body["payment"]["condominium_id"], json!(42));
    assert_eq!(store.snapshot(COMPENSATIONS).await.len(), 1);
    assert_eq!(store.snapshot(PAYMENTS).await.len(), 1);
}

#[actix_web::test]
async fn unassigned_employee_is_rejected_without_writes() {
    let store = Arc::new(InMemoryStore::new());
    let app = billing_app!(store);

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/compensation").set_json(json!({
            "employee_id": 7,
            "net_salary": "2000",
            "social_security": "0",
            "union_contribution": "0",
            "other_deductions": "0",
            "month": 3,
            "year": 2024
        }))
    );

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["retryable"], json!(false));
    assert!(store.snapshot(COMPENSATIONS).await.is_empty());
    assert!(store.snapshot(PAYMENTS).await.is_empty());
}

#[actix_web::test]
async fn preview_reports_the_offending_field() {
    let store = Arc::new(InMemoryStore::new());
    let app = billing_app!(store);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/compensation/preview")
            .set_json(json!({
                "net_salary": "1000",
                "social_security": "150.555",
                "union_contribution": "50",
                "other_deductions": "20",
                "month": 1,
                "year": 2024
            }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!("1180.56"));

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/compensation/preview")
            .set_json(json!({
                "net_salary": "1000",
                "social_security": "0",
                "union_contribution": "0",
                "other_deductions": "0",
                "month": 0,
                "year": 2024
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], json!("month"));
}

#[actix_web::test]
async fn provider_checklist_is_reconciled_minimally() {
    let store = Arc::new(InMemoryStore::new());
    let app = billing_app!(store);

    let (_, first) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/provider/9/condominiums")
            .set_json(json!({ "condominium_ids": [10, 20] }))
    );
    assert_eq!(first, json!({ "added": [10, 20], "removed": [] }));

    let (_, second) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/provider/9/condominiums")
            .set_json(json!({ "condominium_ids": [20, 30] }))
    );
    assert_eq!(second, json!({ "added": [30], "removed": [10] }));

    let (_, again) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/provider/9/condominiums")
            .set_json(json!({ "condominium_ids": [20, 30] }))
    );
    assert_eq!(again, json!({ "added": [], "removed": [] }));

    let (status, members) = send!(
        app,
        test::TestRequest::get().uri("/api/provider/9/condominiums")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members["condominium_ids"], json!([20, 30]));
    assert_eq!(members["owner"], json!("provider"));
}

#[actix_web::test]
async fn paired_delete_leaves_no_orphans() {
    let store = Arc::new(InMemoryStore::new());
    let app = billing_app!(store);

    send!(
        app,
        test::TestRequest::put()
            .uri("/api/employee/7/condominiums")
            .set_json(json!({ "condominium_ids": [42] }))
    );
    let (_, saved) = send!(
        app,
        test::TestRequest::post().uri("/api/compensation").set_json(json!({
            "employee_id": 7,
            "net_salary": "2000",
            "social_security": "0",
            "union_contribution": "0",
            "other_deductions": "0",
            "month": 5,
            "year": 2024
        }))
    );
    let id = saved["compensation"]["id"].as_u64().expect("compensation id");

    let (status, _) = send!(
        app,
        test::TestRequest::delete().uri(&format!("/api/compensation/{id}?with_payment=true"))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, orphans) = send!(
        app,
        test::TestRequest::get().uri("/api/compensation/orphaned-payments")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orphans, json!([]));

    let (status, _) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/compensation/{id}"))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}
