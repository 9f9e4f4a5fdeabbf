//! Helpers for driving external programs.

use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::CapabilityError;

fn spawn_error(capability: &'static str, program: &str, err: std::io::Error) -> CapabilityError {
    if err.kind() == ErrorKind::NotFound {
        CapabilityError::unavailable(capability, format!("`{}` is not installed", program))
    } else {
        CapabilityError::Io(err)
    }
}

fn failure(program: &str, output: &std::process::Output) -> CapabilityError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let detail = if stderr.is_empty() {
        output.status.to_string()
    } else {
        stderr
    };
    CapabilityError::CommandFailed {
        program: program.to_string(),
        detail,
    }
}

/// Run `program` to completion and return its trimmed stdout.
pub(crate) async fn run(
    capability: &'static str,
    program: &str,
    args: &[&str],
) -> Result<String, CapabilityError> {
    tracing::debug!(program, ?args, "Running helper program");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| spawn_error(capability, program, e))?;
    if !output.status.success() {
        return Err(failure(program, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

/// Run `program` with `input` written to its stdin.
pub(crate) async fn run_with_input(
    capability: &'static str,
    program: &str,
    args: &[&str],
    input: &str,
) -> Result<(), CapabilityError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(capability, program, e))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await?;
        stdin.shutdown().await?;
    }
    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(failure(program, &output));
    }
    Ok(())
}

/// Try each `(program, args)` in turn until one succeeds.
///
/// Returns the name of the program that worked. Missing programs are
/// skipped; if none is installed the capability is reported unavailable.
pub(crate) async fn run_first(
    capability: &'static str,
    candidates: &[(&'static str, &[&str])],
) -> Result<&'static str, CapabilityError> {
    let mut last_failure = None;
    for &(program, args) in candidates {
        match run(capability, program, args).await {
            Ok(_) => return Ok(program),
            Err(CapabilityError::Unavailable { .. }) => continue,
            Err(err) => last_failure = Some(err),
        }
    }
    Err(last_failure.unwrap_or_else(|| {
        CapabilityError::unavailable(capability, "no supported helper program is installed")
    }))
}

/// Start `program` without waiting for it.
pub(crate) fn spawn_detached(
    capability: &'static str,
    program: &str,
    args: &[&str],
) -> Result<(), CapabilityError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| spawn_error(capability, program, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let err = run("Test", "concierge-no-such-program", &[]).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable { capability: "Test", .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = run("Test", "echo", &["hello"]).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_command_failed() {
        let err = run("Test", "false", &[]).await.unwrap_err();
        assert!(matches!(err, CapabilityError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_with_input() {
        run_with_input("Test", "cat", &[], "piped").await.unwrap();
    }

    #[tokio::test]
    async fn test_run_first_reports_unavailable_when_nothing_installed() {
        let err = run_first(
            "Locker",
            &[("concierge-no-such-a", &[]), ("concierge-no-such-b", &[])],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable { capability: "Locker", .. }));
    }
}
