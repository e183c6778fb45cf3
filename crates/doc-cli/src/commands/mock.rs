//! `mock`: serves each operation's generated example response over the
//! same route table, without executing any application code. Intentionally
//! minimal — this never calls into the host application, it only replays
//! the examples the pipeline already generated.

use std::sync::Arc;

use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use crate::commands::generate::build_document_for_export;
use crate::config::ProjectConfig;

struct MockState {
    document: serde_json::Value,
}

pub async fn run(config: ProjectConfig) -> anyhow::Result<()> {
    let document = build_document_for_export(&config)?;
    let state = Arc::new(MockState { document });

    let app = Router::new().route("/{*path}", any(serve_mock)).with_state(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    eprintln!("mock server on http://127.0.0.1:{}/", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_mock(State(state): State<Arc<MockState>>, AxumPath(path): AxumPath<String>) -> Response {
    let normalized = format!("/{path}");
    let Some(path_item) = state.document["paths"].get(&normalized) else {
        return (StatusCode::NOT_FOUND, "no matching operation").into_response();
    };

    let Some(operation) = path_item.as_object().and_then(|m| m.values().next()) else {
        return (StatusCode::NOT_FOUND, "no matching operation").into_response();
    };

    let Some(example) = first_example(operation) else {
        return (StatusCode::NO_CONTENT, ()).into_response();
    };
    axum::Json(example).into_response()
}

fn first_example(operation: &serde_json::Value) -> Option<serde_json::Value> {
    let responses = operation.get("responses")?.as_object()?;
    let success = responses.iter().find(|(status, _)| status.starts_with('2'))?;
    let content = success.1.get("content")?.as_object()?;
    let body = content.values().next()?;
    body.get("example").or_else(|| body.get("schema")).cloned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn picks_the_example_from_the_first_2xx_response() {
        let operation = json!({
            "responses": {
                "422": {"content": {"application/json": {"schema": {}}}},
                "200": {"content": {"application/json": {"example": {"id": 1}}}},
            },
        });
        assert_eq!(first_example(&operation), Some(json!({"id": 1})));
    }

    #[test]
    fn falls_back_to_schema_when_no_example_is_present() {
        let operation = json!({
            "responses": {"200": {"content": {"application/json": {"schema": {"type": "object"}}}}},
        });
        assert_eq!(first_example(&operation), Some(json!({"type": "object"})));
    }

    #[test]
    fn no_success_response_yields_no_example() {
        let operation = json!({"responses": {"404": {}}});
        assert_eq!(first_example(&operation), None);
    }
}
