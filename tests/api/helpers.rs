//! Shared helpers for API integration tests.

use actix_http::Request;
use actix_web::body::{MessageBody, to_bytes};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::HeaderMap;
use actix_web::web::Bytes;
use actix_web::{App, test, web};
use secrecy::SecretString;
use serde_json::{Value, json};

use ourcalendar_lib::api;
use ourcalendar_lib::config::{
    Config, CorsSettings, DatabaseSettings, Environment, GoogleSettings, LineSettings,
    SessionSettings,
};
use ourcalendar_lib::db::DbPool;
use ourcalendar_lib::middleware::{AssignRequestId, PanicRecovery, RequestLogger, cors_policy};
use ourcalendar_lib::services::IdentityVerifier;

use crate::mock_provider::{GoogleAccount, LineAccount, MockIdentityProvider};

pub const GOOGLE_CLIENT_ID: &str = "ourcalendar-test.apps.googleusercontent.com";
pub const LINE_CHANNEL_ID: &str = "1650000000";
pub const SESSION_SECRET: &str = "integration-test-session-secret-0123456789";

/// Config pointing every identity provider endpoint at the mock.
pub fn test_config(mock: &MockIdentityProvider) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        session: SessionSettings {
            secret: SecretString::from(SESSION_SECRET.to_string()),
            ttl_secs: 3600,
        },
        google: GoogleSettings {
            client_ids: vec![GOOGLE_CLIENT_ID.to_string()],
            tokeninfo_url: mock.url("/google/tokeninfo"),
            userinfo_url: mock.url("/google/userinfo"),
        },
        line: LineSettings {
            channel_id: Some(LINE_CHANNEL_ID.to_string()),
            verify_url: mock.url("/line/verify"),
            profile_url: mock.url("/line/profile"),
        },
        cors: CorsSettings {
            permissive: false,
            allowed_origins: vec!["https://app.example.com".to_string()],
        },
    }
}

/// Fresh in-memory database with all migrations applied.
pub async fn create_test_pool() -> DbPool {
    let pool = DbPool::connect("sqlite::memory:", 1, 1)
        .await
        .expect("failed to open test database");
    pool.run_migrations()
        .await
        .expect("failed to run migrations");
    pool
}

/// Initialize the full application with the production middleware stack.
pub async fn create_test_app(
    pool: DbPool,
    config: Config,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let verifier = IdentityVerifier::new(&config).expect("failed to build identity verifier");
    test::init_service(
        App::new()
            .wrap(cors_policy(&config.cors))
            .wrap(PanicRecovery)
            .wrap(RequestLogger)
            .wrap(AssignRequestId)
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(pool))
            .app_data(web::Data::new(verifier))
            .configure(api::configure),
    )
    .await
}

/// Test context: running app plus the mock provider it talks to.
pub struct TestContext<S> {
    pub app: S,
    pub mock: MockIdentityProvider,
}

pub async fn setup() -> TestContext<
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
> {
    let mock = MockIdentityProvider::start().await;
    let config = test_config(&mock);
    let pool = create_test_pool().await;
    let app = create_test_app(pool, config).await;
    TestContext { app, mock }
}

/// Buffered response.
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Send a request and buffer the response.
pub async fn send<S, B>(app: &S, req: test::TestRequest) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = match test::try_call_service(app, req.to_request()).await {
        Ok(resp) => resp,
        // Rendered the way the server renders errors escaping the middleware
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status().as_u16();
            let headers = resp.headers().clone();
            let body = to_bytes(resp.into_body()).await.unwrap_or_default();
            return Reply {
                status,
                headers,
                body,
            };
        }
    };
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let body = test::read_body(resp).await;
    Reply {
        status,
        headers,
        body,
    }
}

/// Attach a bearer session token.
pub fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

/// A signed-in user.
pub struct SignedIn {
    pub token: String,
    pub id: String,
    pub user: Value,
}

/// Register `name` with the mock LINE provider and sign in.
pub async fn sign_in_line<S, B>(app: &S, mock: &MockIdentityProvider, name: &str) -> SignedIn
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let provider_token = format!("line-token-{}", name);
    mock.add_line(
        &provider_token,
        LineAccount {
            user_id: format!("U{}", name.to_lowercase()),
            display_name: name.to_string(),
            picture_url: None,
            channel_id: LINE_CHANNEL_ID.to_string(),
        },
    );

    let reply = send(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/line")
            .set_json(json!({ "token": provider_token })),
    )
    .await;
    assert_eq!(reply.status, 200, "LINE sign-in failed: {}", reply.text());
    signed_in(reply.json())
}

/// Register `name` with the mock Google provider and sign in.
pub async fn sign_in_google<S, B>(
    app: &S,
    mock: &MockIdentityProvider,
    name: &str,
    email: &str,
) -> SignedIn
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let provider_token = format!("google-token-{}", name);
    mock.add_google(
        &provider_token,
        GoogleAccount {
            id: format!("g-{}", name.to_lowercase()),
            email: Some(email.to_string()),
            name: name.to_string(),
            picture: Some(format!("https://lh3.googleusercontent.com/{}", name)),
            audience: GOOGLE_CLIENT_ID.to_string(),
        },
    );

    let reply = send(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google")
            .set_json(json!({ "token": provider_token })),
    )
    .await;
    assert_eq!(reply.status, 200, "Google sign-in failed: {}", reply.text());
    signed_in(reply.json())
}

fn signed_in(body: Value) -> SignedIn {
    SignedIn {
        token: body["accessToken"].as_str().unwrap().to_string(),
        id: body["user"]["id"].as_str().unwrap().to_string(),
        user: body["user"].clone(),
    }
}

/// Create a group as `owner` and return its JSON.
pub async fn create_group<S, B>(app: &S, owner: &SignedIn, name: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let reply = send(
        app,
        authed(test::TestRequest::post().uri("/api/v1/groups"), &owner.token)
            .set_json(json!({ "name": name })),
    )
    .await;
    assert_eq!(reply.status, 201, "group creation failed: {}", reply.text());
    reply.json()
}

/// Join `group` using its invite code.
pub async fn join_group<S, B>(app: &S, user: &SignedIn, group: &Value) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let uri = format!("/api/v1/groups/{}/join", group["id"].as_str().unwrap());
    send(
        app,
        authed(test::TestRequest::post().uri(&uri), &user.token)
            .set_json(json!({ "code": group["inviteCode"] })),
    )
    .await
}

/// Create an event and return the reply.
pub async fn create_event<S, B>(app: &S, user: &SignedIn, body: Value) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(
        app,
        authed(test::TestRequest::post().uri("/api/v1/events"), &user.token).set_json(body),
    )
    .await
}
