//! HotSpot dynamic-attach wire format.
//!
//! A request is the protocol version, the command name and exactly three
//! arguments, each NUL-terminated. The JVM answers with a status line and,
//! for `load`, the agent's return code.

use std::time::Duration;

/// Attach protocol version understood by every HotSpot since JDK 6.
pub const PROTOCOL_VERSION: &str = "1";

/// Arguments per request; unused ones are sent empty.
const ARG_COUNT: usize = 3;

/// Where HotSpot on Linux keeps perf data and attach sockets. The JVM
/// hard-codes it, so `TMPDIR` does not apply.
pub const JVM_TMP_DIR: &str = "/tmp";

/// How long a JVM gets to open its attach socket after `SIGQUIT`.
pub const DEFAULT_ATTACH_TIMEOUT: Duration = Duration::from_secs(10);

#[must_use]
pub fn socket_name(ns_pid: u32) -> String {
    format!(".java_pid{ns_pid}")
}

#[must_use]
pub fn trigger_name(ns_pid: u32) -> String {
    format!(".attach_pid{ns_pid}")
}

/// The `load instrument` request that makes the JVM run a Java agent.
#[must_use]
pub fn load_agent_request(bundle: &str, payload: &str) -> Vec<u8> {
    let agent_arg = format!("{bundle}={payload}");
    encode_request("load", &["instrument", "false", &agent_arg])
}

fn encode_request(command: &str, args: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in [PROTOCOL_VERSION, command]
        .into_iter()
        .chain(args.iter().copied())
        .chain(std::iter::repeat_n("", ARG_COUNT.saturating_sub(args.len())))
    {
        out.extend_from_slice(part.as_bytes());
        out.push(0);
    }
    out
}

/// Why a `load` reply is not a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRejection {
    /// Non-zero attach status or agent return code, with whatever text
    /// followed it.
    Refused { code: i32, detail: String },
    /// The reply did not start with a status line.
    Malformed,
}

/// Interpret the full text the JVM wrote back for a `load` request.
pub fn parse_load_reply(reply: &str) -> Result<(), LoadRejection> {
    let mut lines = reply.lines().map(str::trim).filter(|l| !l.is_empty());
    let status: i32 = lines
        .next()
        .and_then(|l| l.parse().ok())
        .ok_or(LoadRejection::Malformed)?;
    if status != 0 {
        return Err(LoadRejection::Refused {
            code: status,
            detail: lines.collect::<Vec<_>>().join(" "),
        });
    }

    let Some(result) = lines.next() else {
        return Ok(());
    };
    let code = result.strip_prefix("return code:").unwrap_or(result).trim();
    match code.parse::<i32>() {
        Ok(0) => Ok(()),
        Ok(code) => Err(LoadRejection::Refused {
            code,
            detail: lines.collect::<Vec<_>>().join(" "),
        }),
        // Newer JVMs report agent failures as a message after status 0.
        Err(_) => Err(LoadRejection::Refused {
            code: -1,
            detail: std::iter::once(result).chain(lines).collect::<Vec<_>>().join(" "),
        }),
    }
}

/// The innermost pid from a `/proc/<pid>/status` `NSpid:` line.
///
/// A JVM in a container names its socket after the pid it sees itself as.
#[must_use]
pub fn namespace_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("NSpid:"))
        .and_then(|pids| pids.split_whitespace().last())
        .and_then(|pid| pid.parse().ok())
}
