//! `tools/list` response filtering
//!
//! Removes tools whose toolset is not allowed from a downstream `tools/list` reply.
//! Everything else in the message (`jsonrpc`, `id`, `result.nextCursor` and any other
//! field) is kept, and JSON-RPC error replies are passed through untouched. Both plain
//! JSON bodies and `text/event-stream` bodies are supported.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::AllowedToolsets;
use crate::mcp::protocol::{JsonRpcId, JsonRpcResponse};
use crate::toolsets::ToolsetMapper;

/// What to send when a `tools/list` reply cannot be filtered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListFailureMode {
    /// Reply with an empty tool list
    #[default]
    Closed,
    /// Reply with the original, unfiltered body
    Open,
}

#[derive(Debug, thiserror::Error)]
pub enum ListFilterError {
    #[error("tools/list response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tools/list response is not valid UTF-8")]
    Encoding,

    #[error("unexpected tools/list response shape: {0}")]
    Shape(&'static str),
}

/// The top-level members a `tools/list` reply is inspected for, left unparsed so the
/// rest of the message (`id` in particular) can be written back byte for byte.
#[derive(Deserialize)]
struct RawListResponse<'a> {
    #[serde(borrow, default)]
    result: Option<&'a RawValue>,
    #[serde(borrow, default)]
    error: Option<&'a RawValue>,
}

/// Keep the tools whose toolset is allowed, in their original order.
///
/// Tools without a string `name`, and tools the tracker does not know, are dropped.
pub fn filter_tools_by_toolsets(
    tools: Vec<Value>,
    allowed: &AllowedToolsets,
    mapper: &ToolsetMapper,
) -> Vec<Value> {
    tools
        .into_iter()
        .filter(|tool| {
            tool.get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| mapper.is_tool_allowed(name, allowed))
        })
        .collect()
}

/// Filter one serialized `tools/list` reply.
///
/// Only the `result` member is rewritten; every other byte of `payload` is kept, so
/// ids that do not survive a round trip through `f64`/`u64` come back unchanged.
/// Returns `None` for error replies, which are left as they are.
pub fn filter_list_payload(
    payload: &str,
    allowed: &AllowedToolsets,
    mapper: &ToolsetMapper,
) -> Result<Option<String>, ListFilterError> {
    if payload.trim_start().starts_with('[') {
        return Err(ListFilterError::Shape("message is not an object"));
    }

    let response: RawListResponse<'_> = serde_json::from_str(payload)?;
    if response.error.is_some() {
        return Ok(None);
    }
    let raw = response.result.ok_or(ListFilterError::Shape("missing result object"))?.get();

    let mut result: Value = serde_json::from_str(raw)?;
    let tools = result
        .as_object_mut()
        .ok_or(ListFilterError::Shape("missing result object"))?
        .get_mut("tools")
        .ok_or(ListFilterError::Shape("missing result.tools"))?;

    let Value::Array(original) = tools.take() else {
        return Err(ListFilterError::Shape("result.tools is not an array"));
    };

    let total = original.len();
    let filtered = filter_tools_by_toolsets(original, allowed, mapper);
    debug!(kept = filtered.len(), removed = total - filtered.len(), "Filtered tools/list reply");
    *tools = Value::Array(filtered);

    let (before, after) =
        split_around(payload, raw).ok_or(ListFilterError::Shape("result is not part of the message"))?;
    Ok(Some(format!("{}{}{}", before, serde_json::to_string(&result)?, after)))
}

/// Text of `outer` before and after `inner`, which must be a subslice of it
fn split_around<'a>(outer: &'a str, inner: &str) -> Option<(&'a str, &'a str)> {
    let start = (inner.as_ptr() as usize).checked_sub(outer.as_ptr() as usize)?;
    let end = start.checked_add(inner.len())?;
    if outer.get(start..end)? != inner {
        return None;
    }
    Some((outer.get(..start)?, outer.get(end..)?))
}

/// Filter a JSON `tools/list` reply body
pub fn filter_json_body(
    body: &[u8],
    allowed: &AllowedToolsets,
    mapper: &ToolsetMapper,
) -> Result<Vec<u8>, ListFilterError> {
    let payload = std::str::from_utf8(body).map_err(|_| ListFilterError::Encoding)?;

    match filter_list_payload(payload, allowed, mapper)? {
        Some(filtered) => Ok(filtered.into_bytes()),
        None => Ok(body.to_vec()),
    }
}

/// Filter a `text/event-stream` reply body.
///
/// Every event whose data is a JSON-RPC response goes through
/// [`filter_list_payload`]; a rewritten event keeps its other fields and its data
/// lines stay where the first one was. Events that are not JSON, and requests or
/// notifications sent by the server, pass through unchanged.
pub fn filter_sse_body(
    body: &[u8],
    allowed: &AllowedToolsets,
    mapper: &ToolsetMapper,
) -> Result<Vec<u8>, ListFilterError> {
    let text = std::str::from_utf8(body).map_err(|_| ListFilterError::Encoding)?;
    let normalized = text.replace("\r\n", "\n");

    let mut events: Vec<String> = Vec::new();
    for event in normalized.split("\n\n") {
        events.push(filter_sse_event(event, allowed, mapper)?);
    }

    Ok(events.join("\n\n").into_bytes())
}

fn filter_sse_event(
    event: &str,
    allowed: &AllowedToolsets,
    mapper: &ToolsetMapper,
) -> Result<String, ListFilterError> {
    let data: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();
    if data.is_empty() {
        return Ok(event.to_string());
    }

    let payload = data.join("\n");
    let Ok(message) = serde_json::from_str::<Value>(&payload) else {
        return Ok(event.to_string());
    };
    let is_response = message.get("result").is_some() || message.get("error").is_some();
    if !is_response {
        return Ok(event.to_string());
    }

    let Some(filtered) = filter_list_payload(&payload, allowed, mapper)? else {
        return Ok(event.to_string());
    };

    let mut lines: Vec<String> = Vec::new();
    let mut data_written = false;
    for line in event.lines() {
        if line.starts_with("data:") {
            if !data_written {
                lines.extend(filtered.lines().map(|l| format!("data: {}", l)));
                data_written = true;
            }
        } else {
            lines.push(line.to_string());
        }
    }

    Ok(lines.join("\n"))
}

/// Reply sent instead of a `tools/list` response that could not be filtered.
///
/// Keeps the original `id` when it can be recovered from the body and always lists
/// no tools.
pub fn fail_closed_body(original: &[u8], event_stream: bool) -> Vec<u8> {
    let id: Option<JsonRpcId> = if event_stream { None } else { recover_id(original) };
    let response = JsonRpcResponse::success(id, json!({ "tools": [] }));
    let payload = serde_json::to_string(&response).unwrap_or_else(|_| {
        r#"{"jsonrpc":"2.0","id":null,"result":{"tools":[]}}"#.to_string()
    });

    if event_stream {
        format!("event: message\ndata: {}\n\n", payload).into_bytes()
    } else {
        payload.into_bytes()
    }
}

fn recover_id(body: &[u8]) -> Option<JsonRpcId> {
    let message: Value = serde_json::from_slice(body).ok()?;
    serde_json::from_value(message.get("id")?.clone()).ok()
}
