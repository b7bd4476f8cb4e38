//! Detection tool invocation.
//!
//! The tool is asked one yes/no question per call. Spawn failure, a non-zero
//! exit, and a blown deadline all read as "no".

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;

/// Run `command... <flag>` and report whether it exited 0 within `timeout`.
///
/// The child is killed when the deadline passes.
pub async fn confirms(command: &[String], flag: &str, timeout: Duration) -> bool {
    let Some((program, args)) = command.split_first() else {
        return false;
    };

    let mut child = match Command::new(program)
        .args(args)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(%program, flag, error = %e, "detection tool spawn failed");
            return false;
        }
    };

    match time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::debug!(%program, flag, code = ?status.code(), "detection tool exited");
            status.success()
        }
        Ok(Err(e)) => {
            tracing::debug!(%program, flag, error = %e, "detection tool wait failed");
            false
        }
        Err(_) => {
            tracing::debug!(%program, flag, ?timeout, "detection tool timed out; killing");
            if let Err(e) = child.kill().await {
                tracing::debug!(%program, error = %e, "detection tool kill failed");
            }
            false
        }
    }
}
