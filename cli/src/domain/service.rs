//! Request and reply shapes of the injected diagnostic service.
//!
//! Every request is a JSON object `{method, params?}` POSTed to the service
//! root; every reply is the same envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const METHOD_HELLO: &str = "hello";
pub const METHOD_STOP: &str = "stop";
pub const METHOD_VIEW_VALUE: &str = "view-value";
pub const METHOD_TASK_RESULT: &str = "get_task_ret";

/// Reply envelope.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceReply {
    pub success: bool,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<i64>,
}

impl ServiceReply {
    /// `message` or a generic fallback for failed replies.
    #[must_use]
    pub fn failure_message(&self) -> &str {
        self.message.as_deref().unwrap_or("request failed")
    }
}

/// What `hello` reports about the host application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppMeta {
    pub ip: Option<String>,
    pub enable_trace: bool,
    pub app: Option<String>,
    pub env: Option<String>,
}

impl AppMeta {
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} (env: {}, ip: {}, trace: {})",
            self.app.as_deref().unwrap_or("unknown app"),
            self.env.as_deref().unwrap_or("none"),
            self.ip.as_deref().unwrap_or("?"),
            if self.enable_trace { "on" } else { "off" },
        )
    }
}

#[must_use]
pub fn hello_request() -> Value {
    json!({ "method": METHOD_HELLO })
}

#[must_use]
pub fn stop_request() -> Value {
    json!({ "method": METHOD_STOP })
}

/// Read a static field by `class#field`.
#[must_use]
pub fn view_request(class_name: &str, field_name: &str) -> Value {
    json!({
        "method": METHOD_VIEW_VALUE,
        "trace": false,
        "params": {
            "typeClass": class_name,
            "beanName": null,
            "fieldName": field_name,
        },
    })
}

/// Fetch the outcome of a submitted task.
#[must_use]
pub fn task_result_request(req_id: &str) -> Value {
    json!({ "method": METHOD_TASK_RESULT, "params": { "reqId": req_id } })
}

/// The request id a task submission returns, if it was accepted.
#[must_use]
pub fn submitted_task_id(reply: &ServiceReply) -> Option<&str> {
    if reply.success {
        reply.data.as_str()
    } else {
        None
    }
}

/// Render a task result the way the console prints it: a cost line, then
/// scalars verbatim and structures pretty-printed.
#[must_use]
pub fn render_task_result(reply: &ServiceReply) -> String {
    let cost = reply
        .cost
        .map_or_else(|| "?".to_string(), |c| c.to_string());
    let body = if reply.success {
        match &reply.data {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            Value::Bool(_) | Value::Number(_) => reply.data.to_string(),
            structured => {
                serde_json::to_string_pretty(structured).unwrap_or_else(|_| structured.to_string())
            }
        }
    } else {
        format!("req is error\n{}", reply.failure_message())
    };
    format!("[cost:{cost}]\n{body}")
}
