//! Integration tests for the health probe and operator endpoints

mod common;

use actix_web::{http::StatusCode, test};
use lg_api::create_app;
use serde_json::Value;

use common::{app_state, ADMIN_TOKEN};

#[actix_web::test]
async fn test_health_check() {
    let (state, _clock) = app_state(None);
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["rate_limiting_enabled"], true);
    assert_eq!(body["tracked_keys"], 0);
}

#[actix_web::test]
async fn test_admin_routes_hidden_without_configured_token() {
    let (state, _clock) = app_state(None);
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/rate-limits?identity=alice")
        .insert_header(("X-Admin-Token", "anything"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_admin_routes_reject_wrong_token() {
    let (state, _clock) = app_state(Some(ADMIN_TOKEN));
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/rate-limits?identity=alice")
        .insert_header(("X-Admin-Token", "wrong"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/rate-limits?identity=alice")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_status_and_reset_blocked_pair() {
    let (state, _clock) = app_state(Some(ADMIN_TOKEN));
    let origin = Some("203.0.113.5".parse().unwrap());
    for _ in 0..3 {
        state.guard.on_failure(origin, "alice");
    }
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/rate-limits?origin=203.0.113.5&identity=Alice")
        .insert_header(("X-Admin-Token", ADMIN_TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["enabled"], true);
    assert_eq!(body["account_key"], "ip_203.0.113.5:user_alice");
    assert_eq!(body["account"]["blocked"], true);
    assert_eq!(body["account"]["retry_after_seconds"], 1800);
    assert_eq!(body["origin_key"], "ip_203.0.113.5");
    assert_eq!(body["origin"]["failures_in_window"], 3);

    let req = test::TestRequest::delete()
        .uri("/api/v1/admin/rate-limits?origin=203.0.113.5&identity=alice")
        .insert_header(("X-Admin-Token", ADMIN_TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["reset"], true);
    assert_eq!(body["account_key"], "ip_203.0.113.5:user_alice");

    assert!(state.guard.check(origin, "alice").is_ok());

    let req = test::TestRequest::delete()
        .uri("/api/v1/admin/rate-limits?origin=203.0.113.5&identity=alice")
        .insert_header(("X-Admin-Token", ADMIN_TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["reset"], false);
}

#[actix_web::test]
async fn test_status_by_origin_omits_account_scope() {
    let (state, _clock) = app_state(Some(ADMIN_TOKEN));
    let origin = Some("203.0.113.5".parse().unwrap());
    state.guard.on_failure(origin, "alice");
    state.guard.on_failure(origin, "bob");
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/rate-limits?origin=203.0.113.5")
        .insert_header(("X-Admin-Token", ADMIN_TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["account_key"].is_null());
    assert!(body["account"].is_null());
    assert_eq!(body["origin_key"], "ip_203.0.113.5");
    assert_eq!(body["origin"]["failures_in_window"], 2);
    assert_eq!(body["origin"]["blocked"], false);
}

#[actix_web::test]
async fn test_status_requires_origin_or_identity() {
    let (state, _clock) = app_state(Some(ADMIN_TOKEN));
    let app = test::init_service(create_app(state)).await;

    for uri in [
        "/api/v1/admin/rate-limits",
        "/api/v1/admin/rate-limits?identity=%20%20",
        "/api/v1/admin/rate-limits?origin=not-an-ip",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("X-Admin-Token", ADMIN_TOKEN))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

#[actix_web::test]
async fn test_unknown_route_returns_json_not_found() {
    let (state, _clock) = app_state(None);
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}
