//! Attach payload codec.
//!
//! The payload travels to the host as one ASCII string of `&`-joined
//! `key=value` pairs, e.g. `starter=/a.jar&ctx=com.x.Y#Z&port=9090`.
//!
//! Values are written verbatim, with no escaping. A value containing `&`, or
//! one that starts or ends with whitespace (pairs are trimmed on decode),
//! cannot be carried by the wire format; [`encode`] rejects such values
//! rather than rewriting them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port the diagnostic service binds to when nothing else is configured.
pub const DEFAULT_PORT: u16 = 30999;

/// Path of the service artifact to append to the host classpath.
pub const KEY_STARTER: &str = "starter";
/// Context locator, `class#field`.
pub const KEY_CTX: &str = "ctx";
/// Literal environment name.
pub const KEY_ENV: &str = "env";
/// Property key to read the environment name from inside the host.
pub const KEY_ENV_KEY: &str = "envKey";
/// Port for the diagnostic service.
pub const KEY_PORT: &str = "port";

const PAIR_SEPARATOR: char = '&';
const KNOWN_KEYS: [&str; 5] = [KEY_STARTER, KEY_CTX, KEY_ENV, KEY_ENV_KEY, KEY_PORT];

/// Errors raised while building or validating an attach payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("value for '{key}' contains '&', which the payload format cannot carry")]
    Delimiter { key: &'static str },

    #[error("value for '{key}' starts or ends with whitespace, which the payload format trims")]
    Padding { key: &'static str },

    #[error("value for '{key}' is empty")]
    Empty { key: &'static str },

    #[error("port must be between 1 and 65535")]
    ZeroPort,

    #[error("missing required payload field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Fully validated parameters for one attach attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachParameters {
    /// Absolute path of the service artifact inside the host's filesystem view.
    pub starter: String,
    /// Context locator, `class#field`.
    pub ctx: String,
    /// Literal environment name. Takes priority over `env_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    /// Property key resolved inside the host when `env` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_key: Option<String>,
    /// Port for the diagnostic service.
    pub port: u16,
}

/// Where the environment name comes from. Exactly one path is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSource<'a> {
    /// Use this value as-is.
    Literal(&'a str),
    /// Ask the host for the property with this key.
    Property(&'a str),
    /// Leave the environment unset.
    Unset,
}

impl AttachParameters {
    /// Resolution path for the environment name: `env` wins over `env_key`.
    #[must_use]
    pub fn env_source(&self) -> EnvSource<'_> {
        match (self.env.as_deref(), self.env_key.as_deref()) {
            (Some(env), _) => EnvSource::Literal(env),
            (None, Some(key)) => EnvSource::Property(key),
            (None, None) => EnvSource::Unset,
        }
    }
}

/// Payload fields as decoded from the wire, before required-field validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPayload {
    pub starter: Option<String>,
    pub ctx: Option<String>,
    pub env: Option<String>,
    pub env_key: Option<String>,
    pub port: Option<u16>,
}

impl DecodedPayload {
    /// Names of the required fields that are absent, in wire order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.starter.is_none() {
            missing.push(KEY_STARTER);
        }
        if self.ctx.is_none() {
            missing.push(KEY_CTX);
        }
        if self.port.is_none() {
            missing.push(KEY_PORT);
        }
        missing
    }

    /// Promote to [`AttachParameters`]; any missing required field invalidates
    /// the whole set.
    pub fn into_parameters(self) -> Result<AttachParameters, PayloadError> {
        let missing = self.missing_fields();
        match (self.starter, self.ctx, self.port) {
            (Some(starter), Some(ctx), Some(port)) => Ok(AttachParameters {
                starter,
                ctx,
                env: self.env,
                env_key: self.env_key,
                port,
            }),
            _ => Err(PayloadError::MissingFields(missing)),
        }
    }
}

/// Encode parameters into the wire format.
///
/// Pairs are emitted in the order `starter`, `ctx`, `port`, `env`, `envKey`;
/// absent optional fields are omitted.
pub fn encode(params: &AttachParameters) -> Result<String, PayloadError> {
    if params.port == 0 {
        return Err(PayloadError::ZeroPort);
    }
    let port = params.port.to_string();
    let mut pairs: Vec<(&'static str, &str)> = vec![
        (KEY_STARTER, params.starter.as_str()),
        (KEY_CTX, params.ctx.as_str()),
        (KEY_PORT, port.as_str()),
    ];
    if let Some(env) = params.env.as_deref() {
        pairs.push((KEY_ENV, env));
    }
    if let Some(env_key) = params.env_key.as_deref() {
        pairs.push((KEY_ENV_KEY, env_key));
    }

    let mut out = String::new();
    for (key, value) in pairs {
        check_wire_value(key, value)?;
        if !out.is_empty() {
            out.push(PAIR_SEPARATOR);
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    Ok(out)
}

/// Decode a wire payload. Never fails: unknown keys are ignored, empty values
/// are treated as absent, and an unparsable or zero `port` is dropped.
#[must_use]
pub fn decode(payload: &str) -> DecodedPayload {
    let mut decoded = DecodedPayload::default();
    for pair in payload.split(PAIR_SEPARATOR) {
        let pair = pair.trim();
        let Some((key, value)) = KNOWN_KEYS.iter().find_map(|key| {
            pair.strip_prefix(*key)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| (*key, value))
        }) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        match key {
            KEY_STARTER => decoded.starter = Some(value.to_string()),
            KEY_CTX => decoded.ctx = Some(value.to_string()),
            KEY_ENV => decoded.env = Some(value.to_string()),
            KEY_ENV_KEY => decoded.env_key = Some(value.to_string()),
            KEY_PORT => decoded.port = value.parse::<u16>().ok().filter(|p| *p > 0),
            _ => {}
        }
    }
    decoded
}

fn check_wire_value(key: &'static str, value: &str) -> Result<(), PayloadError> {
    if value.is_empty() {
        return Err(PayloadError::Empty { key });
    }
    if value.contains(PAIR_SEPARATOR) {
        return Err(PayloadError::Delimiter { key });
    }
    if value.trim() != value {
        return Err(PayloadError::Padding { key });
    }
    Ok(())
}
