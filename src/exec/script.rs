//! Subprocess runner for persisted script bodies
//!
//! Library tools run in an isolated subprocess: `sh -c` for shell bodies,
//! `python3 -c` for python bodies. Arguments arrive as environment
//! variables - `ARGS_JSON` carries the full argument object, and each
//! top-level key is also exported as `ARG_<KEY>` for convenience. Keys
//! that differ only in case would map to the same variable, so those
//! argument sets are rejected before the child is spawned. The timeout
//! is enforced here; expiry kills the child and yields a timeout
//! observation.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use super::{Observation, truncate_output};
use crate::library::ToolKind;

/// Run a script body with the given arguments, bounded by `timeout`.
pub async fn run_script(
    kind: ToolKind,
    body: &str,
    args: &Value,
    timeout: Duration,
    workdir: &std::path::Path,
) -> Observation {
    let (program, flag) = match kind {
        ToolKind::Shell => ("sh", "-c"),
        ToolKind::Python => ("python3", "-c"),
    };

    let mut command = Command::new(program);
    command
        .arg(flag)
        .arg(body)
        .current_dir(workdir)
        .env("ARGS_JSON", args.to_string())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(map) = args.as_object() {
        let mut exported: BTreeMap<String, &str> = BTreeMap::new();
        for (key, value) in map {
            let env_name = format!("ARG_{}", key.to_uppercase());
            if let Some(first) = exported.insert(env_name.clone(), key) {
                return Observation::rejected(format!(
                    "argument names '{}' and '{}' both map to {}",
                    first, key, env_name
                ));
            }
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            command.env(env_name, text);
        }
    }

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Observation::failure(format!("failed to spawn {}: {}", program, e), ""),
        Err(_) => return Observation::timeout(),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let combined = if stdout.is_empty() && !stderr.is_empty() {
        stderr.to_string()
    } else if stderr.is_empty() {
        stdout.to_string()
    } else {
        format!("{}\n\nSTDERR:\n{}", stdout, stderr)
    };
    let combined = truncate_output(combined);

    if output.status.success() {
        Observation::success(combined)
    } else {
        Observation::failure(
            format!("exit code {}", output.status.code().unwrap_or(-1)),
            combined,
        )
    }
}
