//! HTTP-level integration tests for the `/client-id/` lookup.

mod common;

use axum::http::StatusCode;
use common::{body_json, count, post_json, FakeScript, SUCCEEDING_SCRIPT};
use erpbtp_db::models::client::CreateClient;
use erpbtp_db::repositories::ClientRepo;
use serde_json::json;
use sqlx::PgPool;

async fn seed(pool: &PgPool, last_name: &str, email: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let input = CreateClient {
        last_name: last_name.to_string(),
        first_name: None,
        email: email.to_string(),
        company: format!("{last_name} SARL"),
        phone: None,
    };
    ClientRepo::upsert(&mut conn, &input).await.unwrap().0.id
}

fn auto_create_app(pool: PgPool, script: &FakeScript) -> axum::Router {
    let mut config = common::test_config(script.settings());
    config.client_id_auto_create = true;
    common::build_test_app_with(pool, config)
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_lookup_returns_latest_client(pool: PgPool) {
    seed(&pool, "Martin", "a@martin.fr").await;
    let newest = seed(&pool, "Martin", "b@martin.fr").await;

    let script = FakeScript::new(SUCCEEDING_SCRIPT);
    let app = common::build_test_app(pool, &script);
    let response = post_json(app, "/client-id/", json!({"nom": "Martin"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], newest);
    assert_eq!(body["created"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unknown_client_is_404(pool: PgPool) {
    let script = FakeScript::new(SUCCEEDING_SCRIPT);
    let app = common::build_test_app(pool, &script);
    let response = post_json(app, "/client-id/", json!({"nom": "Nobody"})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Client not found: Nobody");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_blank_name_is_400(pool: PgPool) {
    let script = FakeScript::new(SUCCEEDING_SCRIPT);
    let app = common::build_test_app(pool, &script);
    let response = post_json(app, "/client-id/", json!({"nom": "  "})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_auto_create_creates_unknown_client(pool: PgPool) {
    let script = FakeScript::new(SUCCEEDING_SCRIPT);
    let response = post_json(
        auto_create_app(pool.clone(), &script),
        "/client-id/",
        json!({"nom": "Durand", "entreprise": "Durand BTP", "email": "contact@durand.fr"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["created"], true);
    assert!(body["id"].is_number());
    assert_eq!(count(&pool, "clients").await, 1);

    // A second call finds the row it just created.
    let again = body_json(
        post_json(
            auto_create_app(pool.clone(), &script),
            "/client-id/",
            json!({"nom": "Durand", "entreprise": "Durand BTP", "email": "contact@durand.fr"}),
        )
        .await,
    )
    .await;
    assert_eq!(again["id"], body["id"]);
    assert_eq!(again["created"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_auto_create_needs_company_and_email(pool: PgPool) {
    let script = FakeScript::new(SUCCEEDING_SCRIPT);
    let response = post_json(
        auto_create_app(pool.clone(), &script),
        "/client-id/",
        json!({"nom": "Durand", "email": "contact@durand.fr"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(count(&pool, "clients").await, 0);
}
