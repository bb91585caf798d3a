use actix_web::test;
use serde_json::json;

use crate::helpers::{GOOGLE_CLIENT_ID, authed, send, setup, sign_in_google, sign_in_line};
use crate::mock_provider::GoogleAccount;

#[actix_rt::test]
async fn test_malformed_body_is_plain_text_400() {
    let ctx = setup().await;

    let reply = send(
        &ctx.app,
        test::TestRequest::post()
            .uri("/api/v1/auth/line")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"token\": "),
    )
    .await;

    assert_eq!(reply.status, 400);
    assert_eq!(reply.text(), "Invalid request body");
}

#[actix_rt::test]
async fn test_empty_token_is_rejected() {
    let ctx = setup().await;

    for body in [json!({ "token": "" }), json!({ "token": "   " }), json!({})] {
        let reply = send(
            &ctx.app,
            test::TestRequest::post()
                .uri("/api/v1/auth/google")
                .set_json(&body),
        )
        .await;
        assert_eq!(reply.status, 400, "body {} should be rejected", body);
        assert_eq!(reply.json()["error"], "VALIDATION_ERROR");
    }
}

#[actix_rt::test]
async fn test_unknown_provider_token_is_unauthorized() {
    let ctx = setup().await;

    for uri in ["/api/v1/auth/google", "/api/v1/auth/line"] {
        let reply = send(
            &ctx.app,
            test::TestRequest::post()
                .uri(uri)
                .set_json(json!({ "token": "not-a-real-token" })),
        )
        .await;
        assert_eq!(reply.status, 401, "{} accepted a bogus token", uri);
        assert_eq!(reply.json()["error"], "INVALID_CREDENTIAL");
    }
}

#[actix_rt::test]
async fn test_line_sign_in_returns_session() {
    let ctx = setup().await;

    let signed_in = sign_in_line(&ctx.app, &ctx.mock, "Hanako").await;

    assert!(!signed_in.token.is_empty());
    assert_eq!(signed_in.user["name"], "Hanako");
    assert_eq!(signed_in.user["lineId"], "Uhanako");
    // LINE does not share an email address
    assert_eq!(signed_in.user["email"], "");

    let me = send(
        &ctx.app,
        authed(test::TestRequest::get().uri("/api/v1/users/me"), &signed_in.token),
    )
    .await;
    assert_eq!(me.status, 200);
    assert_eq!(me.json()["id"], signed_in.id.as_str());
}

#[actix_rt::test]
async fn test_google_sign_in_returns_bearer_token() {
    let ctx = setup().await;
    ctx.mock.add_google(
        "google-token-taro",
        GoogleAccount {
            id: "g-taro".to_string(),
            email: Some("taro@example.com".to_string()),
            name: "Taro".to_string(),
            picture: None,
            audience: GOOGLE_CLIENT_ID.to_string(),
        },
    );

    let reply = send(
        &ctx.app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google")
            .set_json(json!({ "token": "google-token-taro" })),
    )
    .await;

    assert_eq!(reply.status, 200, "sign-in failed: {}", reply.text());
    let body = reply.json();
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);
    assert_eq!(body["user"]["email"], "taro@example.com");
    assert_eq!(body["user"]["googleId"], "g-taro");
}

#[actix_rt::test]
async fn test_repeat_sign_in_keeps_the_same_user() {
    let ctx = setup().await;

    let first = sign_in_google(&ctx.app, &ctx.mock, "Jiro", "jiro@example.com").await;
    let second = sign_in_google(&ctx.app, &ctx.mock, "Jiro", "jiro@example.com").await;

    assert_eq!(first.id, second.id);
}

#[actix_rt::test]
async fn test_google_token_for_other_client_is_rejected() {
    let ctx = setup().await;
    ctx.mock.add_google(
        "google-token-foreign",
        GoogleAccount {
            id: "g-foreign".to_string(),
            email: Some("foreign@example.com".to_string()),
            name: "Foreign".to_string(),
            picture: None,
            audience: "someone-else.apps.googleusercontent.com".to_string(),
        },
    );

    let reply = send(
        &ctx.app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google")
            .set_json(json!({ "token": "google-token-foreign" })),
    )
    .await;

    assert_eq!(reply.status, 401);
}

#[actix_rt::test]
async fn test_protected_routes_require_session() {
    let ctx = setup().await;

    let missing = send(&ctx.app, test::TestRequest::get().uri("/api/v1/users/me")).await;
    assert_eq!(missing.status, 401);
    assert_eq!(missing.json()["error"], "UNAUTHORIZED");

    let garbage = send(
        &ctx.app,
        authed(test::TestRequest::get().uri("/api/v1/groups"), "not.a.jwt"),
    )
    .await;
    assert_eq!(garbage.status, 401);

    let wrong_scheme = send(
        &ctx.app,
        test::TestRequest::get()
            .uri("/api/v1/events")
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz")),
    )
    .await;
    assert_eq!(wrong_scheme.status, 401);
}
