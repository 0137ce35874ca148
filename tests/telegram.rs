use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vanguard_recon_bot::bot::gate::{Admission, MemberStatus, MembershipDirectory, MembershipGate};
use vanguard_recon_bot::bot::telegram::TelegramApi;
use vanguard_recon_bot::bot::transport::{Button, Keyboard, Transport};
use vanguard_recon_bot::core::scanner::build_client;
use vanguard_recon_bot::errors::{MembershipError, TransportError};

const TOKEN: &str = "123:test";
const GROUP: i64 = -1002000171927;

fn api(server: &MockServer) -> TelegramApi {
    TelegramApi::with_base_url(build_client().unwrap(), &server.uri(), TOKEN)
}

async fn mount_member_status(server: &MockServer, user: i64, status: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/getChatMember", TOKEN)))
        .and(body_json(json!({ "chat_id": GROUP, "user_id": user })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "status": status, "user": { "id": user, "is_bot": false, "first_name": "T" } }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn members_admins_and_creators_are_members() {
    let server = MockServer::start().await;
    for (user, status) in [(1, "member"), (2, "administrator"), (3, "creator")] {
        mount_member_status(&server, user, status).await;
    }

    let api = api(&server);
    for user in 1..=3 {
        assert_eq!(api.status(GROUP, user).await.unwrap(), MemberStatus::Member, "user {}", user);
    }
}

#[tokio::test]
async fn everyone_else_is_not_a_member() {
    let server = MockServer::start().await;
    for (user, status) in [(4, "left"), (5, "kicked"), (6, "restricted")] {
        mount_member_status(&server, user, status).await;
    }

    let api = api(&server);
    for user in 4..=6 {
        assert_eq!(api.status(GROUP, user).await.unwrap(), MemberStatus::NonMember, "user {}", user);
    }
}

#[tokio::test]
async fn rejected_lookup_is_an_error_and_the_gate_admits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/getChatMember", TOKEN)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: member list is inaccessible"
        })))
        .mount(&server)
        .await;

    let api = Arc::new(api(&server));
    let err = api.status(GROUP, 42).await.unwrap_err();
    assert!(matches!(err, MembershipError::Api(ref d) if d.contains("member list is inaccessible")));

    let gate = MembershipGate::new(api, GROUP, "https://t.me/group");
    assert_eq!(gate.admit(42).await, Admission::Allowed);
}

#[tokio::test]
async fn garbled_response_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = api(&server).status(GROUP, 42).await.unwrap_err();
    assert!(matches!(err, MembershipError::Http(_)));
}

#[tokio::test]
async fn send_text_carries_the_keyboard_and_returns_the_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .and(body_json(json!({
            "chat_id": 99,
            "text": "hello",
            "reply_markup": { "inline_keyboard": [[{ "text": "Join", "url": "https://t.me/group" }]] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 77, "chat": { "id": 99 }, "text": "hello" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let keyboard = Keyboard::single_column([Button::Url { label: "Join".into(), url: "https://t.me/group".into() }]);
    let id = api(&server).send_text(99, "hello", Some(&keyboard)).await.unwrap();
    assert_eq!(id, 77);
}

#[tokio::test]
async fn api_refusal_surfaces_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/answerCallbackQuery", TOKEN)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "description": "Bad Request: query is too old"
        })))
        .mount(&server)
        .await;

    let err = api(&server).answer_button("cb1").await.unwrap_err();
    assert!(matches!(err, TransportError::Api(ref d) if d.contains("too old")));
}
