use actix_web::{App, HttpResponse, test, web};
use uuid::Uuid;

use ourcalendar_lib::config::CorsSettings;
use ourcalendar_lib::middleware::{AssignRequestId, PanicRecovery, RequestLogger, cors_policy};

use crate::helpers::{authed, create_group, send, setup, sign_in_line};

#[actix_rt::test]
async fn test_every_response_carries_request_id() {
    let ctx = setup().await;

    for req in [
        test::TestRequest::get().uri("/health"),
        test::TestRequest::get().uri("/api/v1/users/me"),
        test::TestRequest::get().uri("/api/v1/does-not-exist"),
    ] {
        let reply = send(&ctx.app, req).await;
        let id = reply
            .header("x-request-id")
            .unwrap_or_else(|| panic!("no request id on {} response", reply.status));
        assert!(Uuid::parse_str(&id).is_ok());
    }
}

#[actix_rt::test]
async fn test_incoming_request_id_is_echoed() {
    let ctx = setup().await;

    let reply = send(
        &ctx.app,
        test::TestRequest::get()
            .uri("/api/v1/users/me")
            .insert_header(("X-Request-Id", "client-trace-42")),
    )
    .await;

    assert_eq!(reply.status, 401);
    assert_eq!(reply.header("x-request-id").as_deref(), Some("client-trace-42"));
}

#[actix_rt::test]
async fn test_cors_allows_configured_origin() {
    let ctx = setup().await;

    let reply = send(
        &ctx.app,
        test::TestRequest::get()
            .uri("/health")
            .insert_header(("Origin", "https://app.example.com")),
    )
    .await;

    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.header("access-control-allow-origin").as_deref(),
        Some("https://app.example.com")
    );
    let exposed = reply
        .header("access-control-expose-headers")
        .unwrap_or_default()
        .to_lowercase();
    assert!(exposed.contains("x-request-id"));
}

#[actix_rt::test]
async fn test_cors_preflight_for_configured_origin() {
    let ctx = setup().await;

    let reply = send(
        &ctx.app,
        test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/v1/events")
            .insert_header(("Origin", "https://app.example.com"))
            .insert_header(("Access-Control-Request-Method", "POST"))
            .insert_header(("Access-Control-Request-Headers", "authorization, content-type")),
    )
    .await;

    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.header("access-control-allow-origin").as_deref(),
        Some("https://app.example.com")
    );
}

#[actix_rt::test]
async fn test_cors_rejects_unknown_origin() {
    let ctx = setup().await;

    let reply = send(
        &ctx.app,
        test::TestRequest::get()
            .uri("/health")
            .insert_header(("Origin", "https://evil.example.net")),
    )
    .await;

    assert_eq!(reply.status, 400);
    assert!(reply.header("access-control-allow-origin").is_none());
    assert!(reply.header("x-request-id").is_some());
}

#[actix_rt::test]
async fn test_routed_requests_succeed_through_full_stack() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let group = create_group(&ctx.app, &alice, "Family").await;

    for req in [
        test::TestRequest::get().uri("/health"),
        test::TestRequest::get().uri("/api/v1/ready"),
        authed(test::TestRequest::get().uri("/api/v1/users/me"), &alice.token),
        authed(
            test::TestRequest::get().uri(&format!(
                "/api/v1/groups/{}/members",
                group["id"].as_str().unwrap()
            )),
            &alice.token,
        ),
    ] {
        let reply = send(&ctx.app, req).await;
        assert_eq!(reply.status, 200, "unexpected failure: {}", reply.text());
        assert!(reply.header("x-request-id").is_some());
    }
}

async fn explode() -> HttpResponse {
    panic!("handler exploded");
}

async fn calm() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[actix_rt::test]
async fn test_handler_panic_is_500_with_request_id() {
    let app = test::init_service(
        App::new()
            .wrap(cors_policy(&CorsSettings::default()))
            .wrap(PanicRecovery)
            .wrap(RequestLogger)
            .wrap(AssignRequestId)
            .route("/explode", web::get().to(explode))
            .route("/calm", web::get().to(calm)),
    )
    .await;

    let reply = send(&app, test::TestRequest::get().uri("/explode")).await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.json()["error"], "INTERNAL_ERROR");
    assert!(reply.header("x-request-id").is_some());

    let reply = send(&app, test::TestRequest::get().uri("/calm")).await;
    assert_eq!(reply.status, 200);
}
