//! Container lifecycle over the `docker` CLI.
//!
//! No Docker Engine API client exists anywhere in the corpus this crate was
//! grown from, so lifecycle operations shell out to `docker` and parse its
//! stdout, the same way the wider workspace shells out to `git` rather than
//! binding to a library for every external tool it drives.

use std::process::Command;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use scenario_core::ScenarioError;

/// Substrings that cause [`SandboxRuntime::exec`] to refuse a command
/// outright. A coarse net, not a security boundary — the container itself
/// is the boundary.
const DENY_SUBSTRINGS: &[&str] = &["sudo", "-rf"];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of an `exec` call: either the command ran (with its exit code and
/// a possibly-truncated output buffer), or it was refused before running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The command ran to completion (or was killed by its `timeout`
    /// wrapper, which shows up as exit code 124).
    Completed {
        /// Process exit code.
        exit_code: i32,
        /// Concatenated stdout+stderr, truncated to the configured cap.
        output: Vec<u8>,
        /// `true` if the output buffer was truncated.
        truncated: bool,
    },
    /// The command matched the deny list and was never executed.
    Denied {
        /// Human-readable reason, returned to the agent as its own result
        /// rather than raised as an error.
        reason: String,
    },
}

/// Configuration for one runtime's exec behavior.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    /// Seconds after which `timeout` kills an in-container command.
    pub exec_timeout_secs: u64,
    /// Maximum bytes of stdout+stderr retained per `exec` call.
    pub output_cap_bytes: usize,
    /// Maximum time to wait for a container to reach `running` during
    /// `start()`.
    pub start_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            exec_timeout_secs: 120,
            output_cap_bytes: 64 * 1024,
            start_timeout: Duration::from_secs(30),
        }
    }
}

/// Owns one container for the lifetime of a mining/evaluation session.
///
/// Single-writer: callers must serialize `exec` calls against one instance.
/// Multiple instances (one per container) may run concurrently.
pub struct SandboxRuntime {
    image: String,
    container_id: Option<String>,
    config: RuntimeConfig,
}

impl SandboxRuntime {
    /// Create a runtime bound to `image`, not yet backed by a container.
    #[must_use]
    pub fn new(image: impl Into<String>, config: RuntimeConfig) -> Self {
        Self {
            image: image.into(),
            container_id: None,
            config,
        }
    }

    /// The container id, once `create()` has run.
    #[must_use]
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Pull the image unless already present locally.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if the registry rejects the
    /// pull.
    pub fn ensure_image(&self) -> Result<(), ScenarioError> {
        let inspected = Command::new("docker")
            .args(["image", "inspect", &self.image])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker image inspect: {e}")))?;
        if inspected.status.success() {
            debug!(image = %self.image, "image already present");
            return Ok(());
        }

        let pulled = Command::new("docker")
            .args(["pull", &self.image])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker pull: {e}")))?;
        if !pulled.status.success() {
            return Err(ScenarioError::Environment(format!(
                "docker pull {} failed: {}",
                self.image,
                String::from_utf8_lossy(&pulled.stderr)
            )));
        }
        Ok(())
    }

    /// Instantiate a container from the image with a no-op foreground
    /// process keeping it alive, detached.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if `docker create` fails.
    pub fn create(&mut self) -> Result<(), ScenarioError> {
        let output = Command::new("docker")
            .args(["create", &self.image, "tail", "-f", "/dev/null"])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker create: {e}")))?;
        if !output.status.success() {
            return Err(ScenarioError::Environment(format!(
                "docker create failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        self.container_id = Some(id);
        Ok(())
    }

    /// Transition created → running, polling container state every 100 ms
    /// until `running`, `exited`, or the configured start timeout elapses.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if the container has no id
    /// yet, exits during startup, or never reaches `running` before the
    /// timeout.
    pub fn start(&self) -> Result<(), ScenarioError> {
        let id = self
            .container_id
            .as_deref()
            .ok_or_else(|| ScenarioError::Environment("start() before create()".to_owned()))?;

        let started = Command::new("docker")
            .args(["start", id])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker start: {e}")))?;
        if !started.status.success() {
            return Err(ScenarioError::Environment(format!(
                "docker start failed: {}",
                String::from_utf8_lossy(&started.stderr)
            )));
        }

        let deadline = Instant::now() + self.config.start_timeout;
        loop {
            let status = Self::inspect_status(id)?;
            match status.as_str() {
                "running" => return Ok(()),
                "exited" => {
                    return Err(ScenarioError::Environment(format!(
                        "container {id} exited during startup"
                    )));
                }
                other => {
                    if Instant::now() >= deadline {
                        return Err(ScenarioError::Timeout(format!(
                            "container {id} did not reach running within {:?} (last state: {other})",
                            self.config.start_timeout
                        )));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }

    fn inspect_status(id: &str) -> Result<String, ScenarioError> {
        let output = Command::new("docker")
            .args(["inspect", "-f", "{{.State.Status}}", id])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker inspect: {e}")))?;
        if !output.status.success() {
            return Err(ScenarioError::Environment(format!(
                "docker inspect failed for {id}: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    /// Execute `command` under `workdir` inside the container.
    ///
    /// Builds the argv directly rather than composing a shell string for
    /// the outer `docker exec` invocation; only the inner `/bin/bash -c`
    /// layer is unavoidable since the command itself is shell text supplied
    /// by the caller. The deny list is checked against the raw command
    /// before any argv is built — it's a coarse filter, not a shell-escaping
    /// defense.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if there is no running
    /// container or `docker exec` itself cannot be spawned.
    pub fn exec(&self, command: &str, workdir: &str) -> Result<ExecOutcome, ScenarioError> {
        let id = self
            .container_id
            .as_deref()
            .ok_or_else(|| ScenarioError::Environment("exec() before create()/start()".to_owned()))?;

        if let Some(hit) = DENY_SUBSTRINGS.iter().find(|needle| command.contains(**needle)) {
            warn!(%command, matched = %hit, "command rejected by deny list");
            return Ok(ExecOutcome::Denied {
                reason: format!("command matched deny list entry `{hit}`"),
            });
        }

        let timeout_arg = self.config.exec_timeout_secs.to_string();
        let output = Command::new("docker")
            .args([
                "exec",
                "-w",
                workdir,
                id,
                "timeout",
                &timeout_arg,
                "/bin/bash",
                "-c",
                command,
            ])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker exec: {e}")))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        let truncated = combined.len() > self.config.output_cap_bytes;
        combined.truncate(self.config.output_cap_bytes);

        Ok(ExecOutcome::Completed {
            exit_code: output.status.code().unwrap_or(-1),
            output: combined,
            truncated,
        })
    }

    /// Stop (if running) then remove the container. Idempotent: a missing
    /// container id is a no-op.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if either `docker stop` or
    /// `docker rm` fails.
    pub fn stop_and_remove(&mut self) -> Result<(), ScenarioError> {
        let Some(id) = self.container_id.take() else {
            return Ok(());
        };

        let stopped = Command::new("docker")
            .args(["stop", &id])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker stop: {e}")))?;
        if !stopped.status.success() {
            warn!(%id, stderr = %String::from_utf8_lossy(&stopped.stderr), "docker stop reported failure, attempting removal anyway");
        }

        let removed = Command::new("docker")
            .args(["rm", &id])
            .output()
            .map_err(|e| ScenarioError::Environment(format!("docker rm: {e}")))?;
        if !removed.status.success() {
            return Err(ScenarioError::Environment(format!(
                "docker rm {id} failed: {}",
                String::from_utf8_lossy(&removed.stderr)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_list_catches_sudo_and_rf() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        // No container: exec() short-circuits on the missing-id error before
        // reaching the deny check, so assert the check directly instead.
        assert!(DENY_SUBSTRINGS.iter().any(|n| "sudo rm /".contains(n)));
        assert!(DENY_SUBSTRINGS.iter().any(|n| "rm -rf /data".contains(n)));
        assert!(!DENY_SUBSTRINGS.iter().any(|n| "git status".contains(n)));
        drop(runtime);
    }

    #[test]
    fn exec_before_create_is_an_environment_error() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let err = runtime.exec("git status", "/work").expect_err("no container yet");
        assert!(matches!(err, ScenarioError::Environment(_)));
    }
}
