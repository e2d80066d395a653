use super::*;
use crate::session::{Credentials, SessionEvent};
use axum::{
    http::{HeaderMap, StatusCode as AxumStatus},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": authorization }))
}

async fn always_rejected() -> impl IntoResponse {
    (
        AxumStatus::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"})),
    )
}

async fn login_rejected() -> impl IntoResponse {
    (
        AxumStatus::UNAUTHORIZED,
        Json(json!({"detail": "No active account found with the given credentials"})),
    )
}

async fn unverified() -> impl IntoResponse {
    (
        AxumStatus::FORBIDDEN,
        Json(json!({
            "code": "EMAIL_NOT_VERIFIED",
            "message": "Please verify your email",
            "email": "jane.wanjiru@example.com"
        })),
    )
}

async fn broken() -> impl IntoResponse {
    (AxumStatus::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn spawn_gate_server() -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/echo/", get(echo_auth).post(echo_auth))
        .route("/api/protected/", get(always_rejected))
        .route("/api/login/", post(login_rejected))
        .route("/api/unverified/", get(unverified))
        .route("/api/broken/", get(broken));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api/"))
}

fn gate_for(api_url: &str, session: Arc<SessionStore>) -> Arc<RequestGate> {
    RequestGate::with_client(
        Client::new(),
        Url::parse(api_url).expect("api url"),
        session,
    )
}

async fn signed_in(token: &str) -> Arc<SessionStore> {
    let session = SessionStore::in_memory();
    session
        .set(Credentials {
            access_token: token.to_string(),
            refresh_token: None,
        })
        .await
        .expect("sign in");
    session
}

#[tokio::test]
async fn attaches_bearer_token_to_session_requests() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let gate = gate_for(&api_url, signed_in("tok-live").await);

    let body: Value = gate.dispatch(ApiRequest::get("echo/")).await.expect("echo");
    assert_eq!(body["authorization"], "Bearer tok-live");
}

#[tokio::test]
async fn exempt_requests_never_carry_the_credential() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let gate = gate_for(&api_url, signed_in("tok-live").await);

    let request = ApiRequest::post("echo/")
        .json(&json!({"refresh": "r"}))
        .expect("encode")
        .exempt();
    let body: Value = gate.dispatch(request).await.expect("echo");
    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn anonymous_requests_are_still_sent() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let gate = gate_for(&api_url, SessionStore::in_memory());

    let body: Value = gate.dispatch(ApiRequest::get("echo/")).await.expect("echo");
    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn rejection_evicts_session_and_signals_once() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let session = signed_in("tok-stale").await;
    let mut events = session.subscribe();
    let gate = gate_for(&api_url, Arc::clone(&session));

    let results = futures::future::join_all((0..5).map(|_| {
        let gate = Arc::clone(&gate);
        async move { gate.dispatch::<Value>(ApiRequest::get("protected/")).await }
    }))
    .await;

    assert!(results
        .iter()
        .all(|result| matches!(result, Err(ClientError::Unauthorized))));
    assert!(!session.has_valid().await);
    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::ReauthenticationRequired
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn exempt_rejection_is_a_remote_error_not_an_eviction() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let session = signed_in("tok-live").await;
    let gate = gate_for(&api_url, Arc::clone(&session));

    let err = gate
        .dispatch::<Value>(ApiRequest::post("login/").exempt())
        .await
        .expect_err("bad credentials");
    assert!(matches!(err, ClientError::Remote { status: 401, .. }));
    assert!(session.has_valid().await);
}

#[tokio::test]
async fn business_error_codes_get_dedicated_variant() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let gate = gate_for(&api_url, SessionStore::in_memory());

    let err = gate
        .dispatch::<Value>(ApiRequest::get("unverified/"))
        .await
        .expect_err("unverified");
    match err {
        ClientError::EmailNotVerified { email, message } => {
            assert_eq!(email.as_deref(), Some("jane.wanjiru@example.com"));
            assert_eq!(message.as_deref(), Some("Please verify your email"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn plain_text_failures_keep_their_body() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let gate = gate_for(&api_url, SessionStore::in_memory());

    let err = gate
        .dispatch::<Value>(ApiRequest::get("broken/"))
        .await
        .expect_err("server error");
    match err {
        ClientError::Remote { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.summary(), Some("upstream exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gate = gate_for(&format!("http://{addr}/api/"), signed_in("tok").await);
    let err = gate
        .dispatch::<Value>(ApiRequest::get("echo/"))
        .await
        .expect_err("closed port");
    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert!(gate.session().has_valid().await);
}

#[test]
fn endpoint_joins_under_api_root() {
    let gate = gate_for("https://fundi.example.com/api/", SessionStore::in_memory());
    assert_eq!(
        gate.endpoint("/organizations/7/").expect("url").as_str(),
        "https://fundi.example.com/api/organizations/7/"
    );
}

#[tokio::test]
async fn exempt_request_carries_only_its_explicit_bearer() {
    let api_url = spawn_gate_server().await.expect("spawn server");
    let gate = gate_for(&api_url, signed_in("tok-live").await);

    let request = ApiRequest::post("echo/").exempt().bearer("tok-explicit");
    let body: Value = gate.dispatch(request).await.expect("echo");
    assert_eq!(body["authorization"], "Bearer tok-explicit");
}

#[tokio::test]
async fn rejection_of_replaced_token_keeps_new_session_and_is_retryable() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let session = signed_in("tok-old").await;
    let relogin = Arc::clone(&session);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(
        "/api/protected/",
        get(move || {
            let relogin = Arc::clone(&relogin);
            async move {
                relogin
                    .set(Credentials {
                        access_token: "tok-new".into(),
                        refresh_token: None,
                    })
                    .await
                    .expect("relogin");
                AxumStatus::UNAUTHORIZED
            }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let mut events = session.subscribe();
    let gate = gate_for(&format!("http://{addr}/api/"), Arc::clone(&session));
    let err = gate
        .dispatch::<Value>(ApiRequest::get("protected/"))
        .await
        .expect_err("old token rejected");

    assert!(matches!(err, ClientError::StaleCredential));
    assert!(err.is_retryable());
    assert_eq!(session.token().await.as_deref(), Some("tok-new"));
    assert_eq!(events.recv().await.expect("event"), SessionEvent::SignedIn);
    assert!(events.try_recv().is_err());
}
