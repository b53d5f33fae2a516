// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Device commands executed as child processes.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use ap_core::radio::{command_label, CommandRunner, RadioFuture};
use ap_core::RadioError;

/// Runs commands on the local system and captures stdout.
///
/// A non-zero exit status is an error carrying the trimmed stderr. Commands
/// exceeding the timeout are killed.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for ShellRunner {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> RadioFuture<'a, String> {
        Box::pin(async move {
            let label = command_label(program, args);
            debug!("Running '{}'", label);

            let child = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output();
            let output = tokio::time::timeout(self.timeout, child)
                .await
                .map_err(|_| {
                    RadioError::command(&label, format!("timed out after {:?}", self.timeout))
                })?
                .map_err(|e| RadioError::command(&label, e.to_string()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(RadioError::command(
                    &label,
                    format!("{}: {}", output.status, stderr.trim()),
                ));
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let shell = ShellRunner::new(Duration::from_secs(5));
        let output = shell.run("echo", &["ESSID:", "\"1678\""]).await.unwrap();
        assert_eq!(output, "ESSID: \"1678\"\n");
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let shell = ShellRunner::new(Duration::from_secs(5));
        let err = shell.run("false", &[]).await.unwrap_err();
        assert!(matches!(err, RadioError::Command { ref command, .. } if command == "false"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let shell = ShellRunner::new(Duration::from_secs(5));
        assert!(shell.run("/nonexistent/iwinfo", &["wlan0", "info"]).await.is_err());
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let shell = ShellRunner::new(Duration::from_millis(50));
        let err = shell.run("sleep", &["5"]).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
