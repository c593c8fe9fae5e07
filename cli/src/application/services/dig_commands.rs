//! Console commands backed by the diagnostic service.

use anyhow::{Context, Result};
use jdig_common::ContextLocator;
use serde_json::Value;

use crate::application::ports::ServiceClient;
use crate::application::services::console::CommandRegistry;
use crate::domain::error::ServiceError;
use crate::domain::service::{
    AppMeta, hello_request, render_task_result, stop_request, submitted_task_id,
    task_result_request, view_request,
};

/// Register `hello`, `stop`, `view` and the task commands against `client`.
pub fn register_dig_commands<'a, C: ServiceClient>(
    registry: &mut CommandRegistry<'a>,
    client: &'a C,
) {
    registry
        .register("hello", "hello", move |_| hello(client))
        .register("stop", "stop", move |_| stop(client))
        .register("view", "view <className#fieldName>", move |args| {
            view(client, args)
        })
        .register("function-call", "function-call <json>", move |args| {
            task(client, "function-call", args)
        })
        .register("flexible-test", "flexible-test <json>", move |args| {
            task(client, "flexible-test", args)
        })
        .register("spring-cache", "spring-cache <json>", move |args| {
            task(client, "spring-cache", args)
        });
}

/// `hello` as a typed call, shared with the connect path.
pub fn fetch_app_meta(client: &impl ServiceClient) -> Result<AppMeta> {
    let reply = client.call(&hello_request())?;
    if !reply.success {
        return Err(ServiceError::Rejected(reply.failure_message().to_string()).into());
    }
    serde_json::from_value(reply.data).context("unexpected hello reply")
}

fn hello(client: &impl ServiceClient) -> Result<String> {
    Ok(format!("[hello] {}", fetch_app_meta(client)?.summary()))
}

fn stop(client: &impl ServiceClient) -> Result<String> {
    let reply = client.call(&stop_request())?;
    if reply.success {
        Ok("[stop] success".to_string())
    } else {
        Ok(format!("[stop] {}", reply.failure_message()))
    }
}

fn view(client: &impl ServiceClient, args: &str) -> Result<String> {
    let locator = ContextLocator::parse(args)
        .context("view params must be like className#fieldName")?;
    let request = view_request(locator.class_name(), locator.field_name());
    Ok(format!("[view] {}", submit_and_fetch(client, &request)?))
}

fn task(client: &impl ServiceClient, name: &str, args: &str) -> Result<String> {
    let request: Value =
        serde_json::from_str(args).with_context(|| format!("{name} expects a JSON object"))?;
    if !request.is_object() {
        anyhow::bail!("{name} expects a JSON object");
    }
    Ok(format!("[{name}] {}", submit_and_fetch(client, &request)?))
}

/// Submit a task, then fetch its result by request id.
fn submit_and_fetch(client: &impl ServiceClient, request: &Value) -> Result<String> {
    let submitted = client.call(request)?;
    let Some(req_id) = submitted_task_id(&submitted) else {
        return Err(ServiceError::Rejected(format!(
            "submit req error: {}",
            submitted.failure_message()
        ))
        .into());
    };
    tracing::debug!(req_id, "task submitted");
    let result = client.call(&task_result_request(req_id))?;
    Ok(render_task_result(&result))
}
