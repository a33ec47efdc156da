// crates/sponsormatch-cli/src/serve.rs
// ============================================================================
// Module: Stdio Serve Loop
// Description: A newline-delimited JSON transport over stdin/stdout for
//   `ToolRouter`.
// Purpose: Give a deployment a long-running process that answers many tool
//   calls concurrently without framing complexity a single-node deployment
//   does not need.
// Dependencies: serde, serde_json, sponsormatch-mcp, tokio, tracing
// ============================================================================

//! ## Overview
//! Each line on stdin is one request: `{"id": <any>, "tool": "...", "scope":
//! "read_only" | "administrative", "params": {...}}`. Each line written to
//! stdout is one response: `{"id": <echoed>, "ok": <value>}` or `{"id":
//! <echoed>, "error": {"kind": "...", "message": "..."}}`. Requests are
//! dispatched concurrently via [`tokio::task::spawn_blocking`] (the router's
//! handlers are plain synchronous calls); responses may complete out of
//! order, which is why every response echoes the request's `id`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::Mutex as AsyncMutex;

use sponsormatch_core::error::MatchError;
use sponsormatch_mcp::ToolRouter;
use sponsormatch_mcp::ToolScope;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct ToolCall {
    id: Value,
    tool: String,
    #[serde(default = "default_scope")]
    scope: CallScope,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum CallScope {
    ReadOnly,
    Administrative,
}

fn default_scope() -> CallScope {
    CallScope::ReadOnly
}

impl From<CallScope> for ToolScope {
    fn from(scope: CallScope) -> Self {
        match scope {
            CallScope::ReadOnly => Self::ReadOnly,
            CallScope::Administrative => Self::Administrative,
        }
    }
}

/// Runs the stdio serve loop until stdin closes.
///
/// # Errors
///
/// Returns [`CliError`] if stdin cannot be read or stdout cannot be written.
pub async fn run(router: ToolRouter) -> Result<(), CliError> {
    let router = Arc::new(router);
    let stdout = Arc::new(AsyncMutex::new(tokio::io::stdout()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut in_flight = Vec::new();
    while let Some(line) = lines.next_line().await.map_err(|source| CliError::CatalogIo {
        path: "<stdin>".into(),
        source,
    })? {
        if line.trim().is_empty() {
            continue;
        }
        let router = Arc::clone(&router);
        let stdout = Arc::clone(&stdout);
        let handle = tokio::spawn(async move {
            let response = handle_line(router, &line).await;
            let mut payload = serde_json::to_vec(&response)
                .unwrap_or_else(|_| br#"{"id":null,"error":{"kind":"internal","message":"response failed to serialize"}}"#.to_vec());
            payload.push(b'\n');
            let mut stdout = stdout.lock().await;
            let _ = stdout.write_all(&payload).await;
            let _ = stdout.flush().await;
        });
        in_flight.push(handle);
    }
    for handle in in_flight {
        let _ = handle.await;
    }
    Ok(())
}

async fn handle_line(router: Arc<ToolRouter>, line: &str) -> Value {
    let call: ToolCall = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(error) => return json!({ "id": Value::Null, "error": error_body(&MatchError::InvalidInput(error.to_string())) }),
    };
    let id = call.id.clone();
    let outcome = tokio::task::spawn_blocking(move || router.dispatch(&call.tool, call.scope.into(), call.params))
        .await
        .unwrap_or_else(|join_error| Err(MatchError::Internal(format!("dispatch task panicked: {join_error}"))));
    match outcome {
        Ok(result) => json!({ "id": id, "ok": result }),
        Err(error) => json!({ "id": id, "error": error_body(&error) }),
    }
}

fn error_body(error: &MatchError) -> Value {
    json!({ "kind": error.kind(), "message": error.to_string() })
}
