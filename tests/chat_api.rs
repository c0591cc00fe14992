use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use mockito::Matcher;
use serde_json::{Value, json};
use tower::ServiceExt;

use weather_agent::{
    agent::{
        error::AgentError,
        traits::AgentRunner,
        types::{AgentExecuteResult, AgentMode, AgentResult},
    },
    config::{Config, Provider},
    server::{self, AppState},
};

struct Echo;

#[async_trait::async_trait]
impl AgentRunner for Echo {
    async fn invoke(&self, input: &str) -> AgentExecuteResult {
        Ok(AgentResult {
            generation: format!("echo: {input}"),
            ..Default::default()
        })
    }
}

struct Broken;

#[async_trait::async_trait]
impl AgentRunner for Broken {
    async fn invoke(&self, _input: &str) -> AgentExecuteResult {
        Err(AgentError::ToolNotFound("get_stock_price".into()))
    }
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_returns_agent_reply() {
    let app = server::router(AppState::new(Arc::new(Echo)));
    let response = app.oneshot(chat_request(json!({ "message": "hi" }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "response": "echo: hi" }));
}

#[tokio::test]
async fn agent_errors_map_to_500_with_detail() {
    let app = server::router(AppState::new(Arc::new(Broken)));
    let response = app.oneshot(chat_request(json!({ "message": "hi" }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "detail": "Tool not found: get_stock_price" })
    );
}

#[tokio::test]
async fn missing_message_is_rejected() {
    let app = server::router(AppState::new(Arc::new(Echo)));
    let response = app.oneshot(chat_request(json!({ "text": "hi" }))).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = server::router(AppState::new(Arc::new(Echo)));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn configured_app_calls_model_then_weather() {
    let mut mock_server = mockito::Server::new_async().await;
    let completion = mock_server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer or-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "google/gemini-flash-1.5",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": { "name": "get_weather", "arguments": "{\"location\":\"Nairobi\"}" }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let weather = mock_server
        .mock("GET", "/data/2.5/weather")
        .match_query(Matcher::UrlEncoded("q".into(), "Nairobi".into()))
        .with_status(200)
        .with_body(
            json!({
                "coord": { "lon": 36.82, "lat": -1.29 },
                "weather": [{ "description": "few clouds" }],
                "main": { "temp": 22.4 },
                "name": "Nairobi"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut config = Config::default();
    config.llm.provider = Provider::OpenRouter;
    config.llm.base_url = mock_server.url();
    config.weather.base_url = mock_server.url();
    config.agent.mode = AgentMode::ToolCalling;
    config.apply_env_from(|key| match key {
        "OPENROUTER_API_KEY" => Some("or-key".to_string()),
        "OPENWEATHER_API_KEY" => Some("ow-key".to_string()),
        _ => None,
    });
    config.validate().unwrap();

    let app = server::app_from_config(&config).unwrap();
    let response = app
        .oneshot(chat_request(json!({ "message": "Weather in Nairobi?" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    completion.assert_async().await;
    weather.assert_async().await;
    assert_eq!(
        json_body(response).await,
        json!({ "response": "The current temperature in Nairobi is 22.4°C with few clouds." })
    );
}
