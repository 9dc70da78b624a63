#![cfg(feature = "ollama")]

use futures::StreamExt;
use ragline_core::{
    Content, CoreError, GenerateContentConfig, Llm, LlmRequest, ToolDeclaration, collect_content,
    collect_text, generate_text,
};
use ragline_model::{OllamaClient, OllamaConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OllamaClient {
    OllamaClient::new(OllamaConfig::new("llama3.2").with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn test_blocking_chat_returns_full_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "stream": false,
            "messages": [{"role": "user", "content": "Why is the sky blue?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "Rayleigh scattering."},
            "done": true,
            "done_reason": "stop"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let model = client(&mock_server);
    let answer =
        generate_text(&model, LlmRequest::from_prompt("", "Why is the sky blue?")).await.unwrap();

    assert_eq!(answer, "Rayleigh scattering.");
    assert_eq!(model.name(), "llama3.2");
}

#[tokio::test]
async fn test_streaming_chat_yields_fragments_in_order() {
    let mock_server = MockServer::start().await;

    let body = [
        json!({"message": {"role": "assistant", "content": "Rayleigh "}, "done": false}),
        json!({"message": {"role": "assistant", "content": "scatter"}, "done": false}),
        json!({"message": {"role": "assistant", "content": "ing."}, "done": false}),
        json!({
            "message": {"role": "assistant", "content": ""},
            "done": true,
            "done_reason": "stop"
        }),
    ]
    .iter()
    .map(|v| format!("{v}\n"))
    .collect::<String>();

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&mock_server)
        .await;

    let model = client(&mock_server);
    let stream = model.generate_content(LlmRequest::from_prompt("", "q"), true).await.unwrap();
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 4);
    let items: Vec<_> = items.into_iter().map(Result::unwrap).collect();
    assert!(items[..3].iter().all(|r| r.partial && !r.turn_complete));
    assert!(items[3].turn_complete);
    assert_eq!(items[3].finish_reason.as_deref(), Some("stop"));

    let text: String = items.iter().map(|r| r.text()).collect();
    assert_eq!(text, "Rayleigh scattering.");
}

#[tokio::test]
async fn test_tools_and_schema_are_sent() {
    let mock_server = MockServer::start().await;

    let schema = json!({"type": "object", "properties": {"questions": {"type": "array"}}});
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "tools": [{"type": "function", "function": {"name": "get_weather"}}],
            "format": schema,
            "options": {"temperature": 0.0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "get_weather", "arguments": {"city": "Paris"}}}
                ]
            },
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = LlmRequest::new("", vec![Content::user("Weather in Paris?")])
        .with_tools(vec![ToolDeclaration {
            name: "get_weather".into(),
            description: "Get the current weather for a city".into(),
            parameters: json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        }])
        .with_config(GenerateContentConfig {
            temperature: Some(0.0),
            response_schema: Some(schema.clone()),
            ..Default::default()
        });

    let model = client(&mock_server);
    let content = collect_content(model.generate_content(request, false).await.unwrap()).await;
    let content = content.unwrap();
    let calls: Vec<_> = content.function_calls().collect();

    assert_eq!(calls, [("get_weather", &json!({"city": "Paris"}), Some("call_0"))]);
}

#[tokio::test]
async fn test_http_error_is_a_model_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "model not found"})))
        .mount(&mock_server)
        .await;

    let model = client(&mock_server);
    let err = generate_text(&model, LlmRequest::from_prompt("", "q")).await.unwrap_err();
    assert!(matches!(err, CoreError::Model(ref m) if m.contains("model not found")));
}

#[tokio::test]
async fn test_error_line_mid_stream_ends_stream_with_error() {
    let mock_server = MockServer::start().await;

    let body = format!(
        "{}\n{}\n",
        json!({"message": {"role": "assistant", "content": "Hel"}, "done": false}),
        json!({"error": "out of memory"})
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&mock_server)
        .await;

    let model = client(&mock_server);
    let stream = model.generate_content(LlmRequest::from_prompt("", "q"), true).await.unwrap();
    let err = collect_text(stream).await.unwrap_err();
    assert!(err.to_string().contains("out of memory"));
}

#[tokio::test]
async fn test_stream_cut_before_done_is_an_error() {
    let mock_server = MockServer::start().await;

    let body = format!("{}\n", json!({"message": {"content": "Rayleigh "}, "done": false}));
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&mock_server)
        .await;

    let model = client(&mock_server);
    let stream = model.generate_content(LlmRequest::from_prompt("", "q"), true).await.unwrap();
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().text(), "Rayleigh ");
    assert!(matches!(&items[1], Err(CoreError::Model(m)) if m.contains("before done")));

    let stream = model.generate_content(LlmRequest::from_prompt("", "q"), true).await.unwrap();
    assert!(collect_text(stream).await.is_err());
}

#[tokio::test]
async fn test_blocking_reply_not_marked_done_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "Rayleigh "},
            "done": false
        })))
        .mount(&mock_server)
        .await;

    let model = client(&mock_server);
    let err = generate_text(&model, LlmRequest::from_prompt("", "q")).await.unwrap_err();
    assert!(matches!(err, CoreError::Model(ref m) if m.contains("before done")));
}

#[test]
fn test_invalid_config_fails_before_io() {
    let err = OllamaClient::new(OllamaConfig::new("")).unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}
