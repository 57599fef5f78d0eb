// ABOUTME: Notification sink that hands messages to an operator-provided hook script.
// ABOUTME: Discovers `<state_dir>/hooks/notify` and runs it with the message in its environment.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::LogNotifier;
use crate::gateway::{NotificationSink, NotifyError};

/// Name of the hook script inside the hooks directory.
pub const NOTIFY_HOOK: &str = "notify";

/// How long the hook may run before it is killed.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Context passed to the hook via environment variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub subject: String,
    pub message: String,
    pub timestamp: String,
}

impl HookContext {
    pub fn new(subject: &str, message: &str) -> Self {
        Self {
            subject: subject.to_string(),
            message: message.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("FLEETKEEPER_SUBJECT".to_string(), self.subject.clone());
        env.insert("FLEETKEEPER_MESSAGE".to_string(), self.message.clone());
        env.insert("FLEETKEEPER_TIMESTAMP".to_string(), self.timestamp.clone());
        env
    }
}

/// Result of running the hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    /// The hook was killed after running past its time limit.
    pub timed_out: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Logs every notification and forwards it to the notify hook when one exists.
#[derive(Debug, Clone)]
pub struct HookNotifier {
    hooks_dir: PathBuf,
    timeout: Duration,
}

impl HookNotifier {
    /// Look for hooks in `<state_dir>/hooks`.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            hooks_dir: state_dir.join("hooks"),
            timeout: DEFAULT_HOOK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn hook_exists(&self) -> bool {
        self.hook_path().is_file()
    }

    fn hook_path(&self) -> PathBuf {
        self.hooks_dir.join(NOTIFY_HOOK)
    }

    /// Run the hook if it exists.
    ///
    /// Returns None if the hook doesn't exist, or Some(HookResult) if it was run.
    /// A hook still running after the timeout is killed.
    pub async fn run(&self, context: &HookContext) -> Option<HookResult> {
        let hook_path = self.hook_path();

        if !hook_path.is_file() {
            return None;
        }

        tracing::debug!("Running notify hook: {}", hook_path.display());

        let mut command = Command::new(&hook_path);
        command
            .envs(context.to_env())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let output = command.output();

        match tokio::time::timeout(self.timeout, output).await {
            Err(_elapsed) => {
                tracing::warn!("notify hook timed out after {:?}", self.timeout);
                Some(HookResult {
                    success: false,
                    timed_out: true,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("timed out after {:?}", self.timeout),
                })
            }
            Ok(Ok(output)) => {
                let result = HookResult {
                    success: output.status.success(),
                    timed_out: false,
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !result.success {
                    tracing::warn!("notify hook failed with exit code {:?}", result.exit_code);
                }

                Some(result)
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to execute notify hook: {}", e);
                Some(HookResult {
                    success: false,
                    timed_out: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl NotificationSink for HookNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        LogNotifier.publish(subject, message).await?;

        let context = HookContext::new(subject, message);
        match self.run(&context).await {
            Some(result) if result.timed_out => Err(NotifyError::Delivery(format!(
                "notify hook {}",
                result.stderr
            ))),
            Some(result) if !result.success => Err(NotifyError::Delivery(format!(
                "notify hook exited with {:?}: {}",
                result.exit_code,
                result.stderr.trim()
            ))),
            _ => Ok(()),
        }
    }
}
