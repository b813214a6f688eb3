//! Model gateway against a fake chat-completions provider.

use std::time::Duration;

use serde_json::{Value, json};
use threadcraft::gateway::{
    Completion, GatewayError, ModelGateway, Provider, ProviderConfig, STRICT_JSON_SUFFIX,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

const ENDPOINT: &str = "/api/v1/chat/completions";

fn provider(server: &MockServer, model: &str) -> ProviderConfig {
    ProviderConfig {
        provider: Provider::OpenRouter,
        api_key: Some("test-key".into()),
        model: model.into(),
        base_url: format!("{}/api/v1", server.uri()),
    }
}

fn completion(json_mode: bool) -> Completion<'static> {
    Completion {
        system: "You are a precise research-paper analyst.",
        prompt: "Analyze the paper.",
        temperature: 0.2,
        json_mode,
    }
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| serde_json::from_slice(&req.body).unwrap())
        .collect()
}

fn gateway() -> ModelGateway {
    ModelGateway::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn returns_content_and_sends_routing_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-title", "ThreadCraft"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-4o",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(reply(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let content = gateway()
        .call(&provider(&server, "openai/gpt-4o"), completion(true))
        .await
        .unwrap();
    assert_eq!(content, r#"{"ok":true}"#);
}

#[tokio::test]
async fn rejected_json_mode_is_retried_once_without_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":{"message":"response_format json_object is not supported"}}"#,
        ))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply("{}"))
        .mount(&server)
        .await;

    let content = gateway()
        .call(&provider(&server, "openai/gpt-4o"), completion(true))
        .await
        .unwrap();
    assert_eq!(content, "{}");

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].get("response_format").is_some());
    assert!(bodies[1].get("response_format").is_none());
    assert!((bodies[1]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    assert!(
        bodies[1]["messages"][0]["content"]
            .as_str()
            .unwrap()
            .ends_with(STRICT_JSON_SUFFIX)
    );
}

#[tokio::test]
async fn system_role_rejection_folds_into_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("Unsupported value: role 'system' is not supported with this model."),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply("text"))
        .mount(&server)
        .await;

    gateway()
        .call(&provider(&server, "openai/o1-mini"), completion(false))
        .await
        .unwrap();

    let bodies = request_bodies(&server).await;
    let messages = bodies[1]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert!(
        messages[0]["content"]
            .as_str()
            .unwrap()
            .starts_with("You are a precise research-paper analyst.")
    );
}

#[tokio::test]
async fn second_failure_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad response_format"))
        .expect(2)
        .mount(&server)
        .await;

    let err = gateway()
        .call(&provider(&server, "openai/gpt-4o"), completion(true))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("OpenRouter error: 400"));
}

#[tokio::test]
async fn unrelated_errors_propagate_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway()
        .call(&provider(&server, "openai/gpt-4o"), completion(true))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Upstream { status: 500, ref body, .. } if body == "upstream overloaded"
    ));
}

#[tokio::test]
async fn unsupported_vendor_never_sends_json_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply("{}"))
        .mount(&server)
        .await;

    gateway()
        .call(&provider(&server, "anthropic/claude-3.7-sonnet"), completion(true))
        .await
        .unwrap();

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].get("response_format").is_none());
    assert!(
        bodies[0]["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains(STRICT_JSON_SUFFIX)
    );
}

#[tokio::test]
async fn empty_or_unreadable_replies_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/empty/chat/completions"))
        .respond_with(reply("   "))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/garbage/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let mut empty = provider(&server, "openai/gpt-4o");
    empty.base_url = format!("{}/empty", server.uri());
    let err = gateway().call(&empty, completion(false)).await.unwrap_err();
    assert!(matches!(err, GatewayError::EmptyContent(Provider::OpenRouter)));

    let mut garbage = provider(&server, "openai/gpt-4o");
    garbage.base_url = format!("{}/garbage", server.uri());
    let err = gateway().call(&garbage, completion(false)).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }));
}

#[tokio::test]
async fn slow_provider_hits_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply("{}").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(Duration::from_millis(200)).unwrap();
    let err = gateway
        .call(&provider(&server, "openai/gpt-4o"), completion(false))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Timeout { .. }));
}
