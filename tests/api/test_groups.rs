use actix_web::test;
use serde_json::json;

use crate::helpers::{
    authed, create_event, create_group, join_group, send, setup, sign_in_google, sign_in_line,
};

#[actix_rt::test]
async fn test_create_group_makes_creator_admin() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;

    let group = create_group(&ctx.app, &alice, "  Family  ").await;
    assert_eq!(group["name"], "Family");
    assert_eq!(group["createdBy"], alice.id.as_str());
    let code = group["inviteCode"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(
        code.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    );

    let reply = send(
        &ctx.app,
        authed(test::TestRequest::get().uri("/api/v1/groups"), &alice.token),
    )
    .await;
    assert_eq!(reply.status, 200);
    let groups = reply.json();
    assert_eq!(groups.as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["id"], group["id"]);
    assert_eq!(groups[0]["role"], "admin");
}

#[actix_rt::test]
async fn test_create_group_validates_input() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;

    for body in [
        json!({ "name": "" }),
        json!({ "name": "y".repeat(101) }),
        json!({ "name": "Club", "iconUrl": "ftp://example.com/icon.png" }),
    ] {
        let reply = send(
            &ctx.app,
            authed(test::TestRequest::post().uri("/api/v1/groups"), &alice.token)
                .set_json(&body),
        )
        .await;
        assert_eq!(reply.status, 400, "body {} should be rejected", body);
    }
}

#[actix_rt::test]
async fn test_family_join_flow() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let bob = sign_in_line(&ctx.app, &ctx.mock, "Bob").await;
    let group = create_group(&ctx.app, &alice, "Family").await;
    let group_id = group["id"].as_str().unwrap();

    // Codes are accepted regardless of case and surrounding whitespace
    let code = group["inviteCode"].as_str().unwrap().to_lowercase();
    let reply = send(
        &ctx.app,
        authed(
            test::TestRequest::post().uri(&format!("/api/v1/groups/{}/join", group_id)),
            &bob.token,
        )
        .set_json(json!({ "code": format!("  {}  ", code) })),
    )
    .await;
    assert_eq!(reply.status, 201, "join failed: {}", reply.text());
    let membership = reply.json();
    assert_eq!(membership["userId"], bob.id.as_str());
    assert_eq!(membership["groupId"], group_id);
    assert_eq!(membership["role"], "member");

    let again = join_group(&ctx.app, &bob, &group).await;
    assert_eq!(again.status, 409);
    assert_eq!(again.json()["error"], "CONFLICT");

    let detail = send(
        &ctx.app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/groups/{}", group_id)),
            &bob.token,
        ),
    )
    .await;
    assert_eq!(detail.status, 200);
    let detail = detail.json();
    assert_eq!(detail["name"], "Family");
    let members = detail["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["userId"], alice.id.as_str());
    assert_eq!(members[0]["role"], "admin");
}

#[actix_rt::test]
async fn test_join_rejects_wrong_codes() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let bob = sign_in_line(&ctx.app, &ctx.mock, "Bob").await;
    let family = create_group(&ctx.app, &alice, "Family").await;
    let club = create_group(&ctx.app, &alice, "Club").await;
    let family_uri = format!("/api/v1/groups/{}/join", family["id"].as_str().unwrap());

    for code in [json!("ZZZZZZ"), json!("abc"), json!(""), club["inviteCode"].clone()] {
        let reply = send(
            &ctx.app,
            authed(test::TestRequest::post().uri(&family_uri), &bob.token)
                .set_json(json!({ "code": code })),
        )
        .await;
        assert_eq!(reply.status, 404, "code {} should not join Family", code);
    }
}

#[actix_rt::test]
async fn test_non_members_cannot_see_group() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let carol = sign_in_line(&ctx.app, &ctx.mock, "Carol").await;
    let group = create_group(&ctx.app, &alice, "Family").await;
    let group_id = group["id"].as_str().unwrap();

    let forbidden = send(
        &ctx.app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/groups/{}", group_id)),
            &carol.token,
        ),
    )
    .await;
    assert_eq!(forbidden.status, 403);

    let members = send(
        &ctx.app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/groups/{}/members", group_id)),
            &carol.token,
        ),
    )
    .await;
    assert_eq!(members.status, 403);

    for uri in [
        format!("/api/v1/groups/{}", uuid::Uuid::new_v4()),
        "/api/v1/groups/not-a-uuid".to_string(),
    ] {
        let reply = send(
            &ctx.app,
            authed(test::TestRequest::get().uri(&uri), &alice.token),
        )
        .await;
        assert_eq!(reply.status, 404, "{} should be missing", uri);
    }
}

#[actix_rt::test]
async fn test_only_admins_update_group() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let bob = sign_in_line(&ctx.app, &ctx.mock, "Bob").await;
    let group = create_group(&ctx.app, &alice, "Family").await;
    join_group(&ctx.app, &bob, &group).await;
    let uri = format!("/api/v1/groups/{}", group["id"].as_str().unwrap());

    let denied = send(
        &ctx.app,
        authed(test::TestRequest::put().uri(&uri), &bob.token)
            .set_json(json!({ "name": "Bob's" })),
    )
    .await;
    assert_eq!(denied.status, 403);

    let updated = send(
        &ctx.app,
        authed(test::TestRequest::put().uri(&uri), &alice.token).set_json(
            json!({ "name": "Tanaka Family", "iconUrl": "https://example.com/home.png" }),
        ),
    )
    .await;
    assert_eq!(updated.status, 200, "update failed: {}", updated.text());
    let body = updated.json();
    assert_eq!(body["name"], "Tanaka Family");
    assert_eq!(body["iconUrl"], "https://example.com/home.png");
    assert_eq!(body["inviteCode"], group["inviteCode"]);
}

#[actix_rt::test]
async fn test_last_admin_leaving_promotes_member() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let bob = sign_in_line(&ctx.app, &ctx.mock, "Bob").await;
    let group = create_group(&ctx.app, &alice, "Family").await;
    join_group(&ctx.app, &bob, &group).await;
    let group_id = group["id"].as_str().unwrap();

    let left = send(
        &ctx.app,
        authed(
            test::TestRequest::post().uri(&format!("/api/v1/groups/{}/leave", group_id)),
            &alice.token,
        ),
    )
    .await;
    assert_eq!(left.status, 204);

    let groups = send(
        &ctx.app,
        authed(test::TestRequest::get().uri("/api/v1/groups"), &bob.token),
    )
    .await
    .json();
    assert_eq!(groups[0]["id"], group_id);
    assert_eq!(groups[0]["role"], "admin");

    let alice_groups = send(
        &ctx.app,
        authed(test::TestRequest::get().uri("/api/v1/groups"), &alice.token),
    )
    .await
    .json();
    assert!(alice_groups.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_last_member_leaving_deletes_group() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let group = create_group(&ctx.app, &alice, "Solo").await;
    let group_id = group["id"].as_str().unwrap();

    let left = send(
        &ctx.app,
        authed(
            test::TestRequest::post().uri(&format!("/api/v1/groups/{}/leave", group_id)),
            &alice.token,
        ),
    )
    .await;
    assert_eq!(left.status, 204);

    let gone = send(
        &ctx.app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/groups/{}", group_id)),
            &alice.token,
        ),
    )
    .await;
    assert_eq!(gone.status, 404);

    let again = send(
        &ctx.app,
        authed(
            test::TestRequest::post().uri(&format!("/api/v1/groups/{}/leave", group_id)),
            &alice.token,
        ),
    )
    .await;
    assert_eq!(again.status, 404);
}

#[actix_rt::test]
async fn test_member_removal_rules() {
    let ctx = setup().await;
    let alice = sign_in_line(&ctx.app, &ctx.mock, "Alice").await;
    let bob = sign_in_line(&ctx.app, &ctx.mock, "Bob").await;
    let carol = sign_in_line(&ctx.app, &ctx.mock, "Carol").await;
    let group = create_group(&ctx.app, &alice, "Family").await;
    join_group(&ctx.app, &bob, &group).await;
    join_group(&ctx.app, &carol, &group).await;
    let group_id = group["id"].as_str().unwrap();
    let member_uri = |user_id: &str| format!("/api/v1/groups/{}/members/{}", group_id, user_id);

    // Members cannot remove each other
    let denied = send(
        &ctx.app,
        authed(test::TestRequest::delete().uri(&member_uri(&carol.id)), &bob.token),
    )
    .await;
    assert_eq!(denied.status, 403);

    // Removing yourself is leaving
    let self_removed = send(
        &ctx.app,
        authed(test::TestRequest::delete().uri(&member_uri(&bob.id)), &bob.token),
    )
    .await;
    assert_eq!(self_removed.status, 204);

    let removed = send(
        &ctx.app,
        authed(test::TestRequest::delete().uri(&member_uri(&carol.id)), &alice.token),
    )
    .await;
    assert_eq!(removed.status, 204);

    let not_member = send(
        &ctx.app,
        authed(test::TestRequest::delete().uri(&member_uri(&carol.id)), &alice.token),
    )
    .await;
    assert_eq!(not_member.status, 404);

    let members = send(
        &ctx.app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/groups/{}/members", group_id)),
            &alice.token,
        ),
    )
    .await
    .json();
    assert_eq!(members.as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_deleting_group_detaches_events() {
    let ctx = setup().await;
    let alice = sign_in_google(&ctx.app, &ctx.mock, "Alice", "alice@example.com").await;
    let bob = sign_in_line(&ctx.app, &ctx.mock, "Bob").await;
    let group = create_group(&ctx.app, &alice, "Family").await;
    join_group(&ctx.app, &bob, &group).await;
    let group_id = group["id"].as_str().unwrap();

    let event = create_event(
        &ctx.app,
        &alice,
        json!({
            "title": "Dinner",
            "startAt": "2026-11-01T18:00:00Z",
            "endAt": "2026-11-01T20:00:00Z",
            "groupId": group_id,
        }),
    )
    .await
    .json();
    assert_eq!(event["isShared"], true);
    let event_uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    let denied = send(
        &ctx.app,
        authed(
            test::TestRequest::delete().uri(&format!("/api/v1/groups/{}", group_id)),
            &bob.token,
        ),
    )
    .await;
    assert_eq!(denied.status, 403);

    let deleted = send(
        &ctx.app,
        authed(
            test::TestRequest::delete().uri(&format!("/api/v1/groups/{}", group_id)),
            &alice.token,
        ),
    )
    .await;
    assert_eq!(deleted.status, 204);

    let kept = send(
        &ctx.app,
        authed(test::TestRequest::get().uri(&event_uri), &alice.token),
    )
    .await;
    assert_eq!(kept.status, 200);
    let kept = kept.json();
    assert!(kept["groupId"].is_null());
    assert_eq!(kept["isShared"], false);

    // Former members lose sight of it
    let hidden = send(
        &ctx.app,
        authed(test::TestRequest::get().uri(&event_uri), &bob.token),
    )
    .await;
    assert_eq!(hidden.status, 403);
}
