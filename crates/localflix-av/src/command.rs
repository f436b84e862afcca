//! Running external tools with a concurrency limit and a timeout.
//!
//! Every subprocess localflix starts goes through a [`ToolRunner`]. The
//! production implementation is [`ProcessToolRunner`]; tests substitute
//! their own runner to count or script invocations.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::{Error, Result};

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard ceiling for any configured timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Default number of tool processes allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// External programs localflix knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    /// Executable name looked up on `PATH`.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tool invocation: which program and with what arguments.
///
/// # Example
///
/// ```
/// use localflix_av::{Tool, ToolInvocation};
///
/// let mut inv = ToolInvocation::new(Tool::Ffprobe);
/// inv.arg("-v").arg("error").arg("/media/movie.mkv");
/// assert_eq!(inv.args().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    tool: Tool,
    args: Vec<String>,
}

impl ToolInvocation {
    /// Create an invocation of `tool` with no arguments.
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args_from(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Output captured from a successful tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// Runs external tools on behalf of the asset cache and the catalog.
///
/// Implementations return `Ok` only when the process exited successfully.
/// A non-zero exit is [`Error::ToolFailed`] carrying the tool's stderr.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput>;
}

/// Resolved executable locations for each [`Tool`].
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(Tool::Ffmpeg.name()),
            ffprobe: PathBuf::from(Tool::Ffprobe.name()),
        }
    }
}

impl ToolPaths {
    pub fn path(&self, tool: Tool) -> &PathBuf {
        match tool {
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Ffprobe => &self.ffprobe,
        }
    }
}

/// [`ToolRunner`] that spawns real subprocesses.
///
/// At most `max_concurrent` processes run at once; callers beyond that wait
/// for a permit. A process that outlives the timeout is killed.
#[derive(Debug, Clone)]
pub struct ProcessToolRunner {
    paths: ToolPaths,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl ProcessToolRunner {
    /// Create a runner. `timeout` is capped at [`MAX_TIMEOUT`] and
    /// `max_concurrent` is raised to at least one.
    pub fn new(paths: ToolPaths, timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            paths,
            timeout: timeout.min(MAX_TIMEOUT),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessToolRunner {
    fn default() -> Self {
        Self::new(ToolPaths::default(), DEFAULT_TIMEOUT, DEFAULT_MAX_CONCURRENT)
    }
}

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        let tool = invocation.tool();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::tool_failed(tool.name(), "runner is shut down"))?;

        let mut cmd = Command::new(self.paths.path(tool));
        cmd.args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(tool = %tool, args = ?invocation.args(), "Running tool");

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(tool.name())
            } else {
                Error::Io(e)
            }
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                tracing::warn!(tool = %tool, timeout = ?self.timeout, "Tool timed out, killed");
                return Err(Error::tool_timeout(tool.name(), self.timeout));
            }
        };

        let tool_output = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(Error::tool_failed(
                tool.name(),
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }

        Ok(tool_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_for(program: &str, timeout: Duration) -> ProcessToolRunner {
        let paths = ToolPaths {
            ffmpeg: PathBuf::from(program),
            ffprobe: PathBuf::from(program),
        };
        ProcessToolRunner::new(paths, timeout, 2)
    }

    #[test]
    fn timeout_is_capped() {
        let runner = ProcessToolRunner::new(ToolPaths::default(), Duration::from_secs(9999), 1);
        assert_eq!(runner.timeout(), MAX_TIMEOUT);
    }

    #[test]
    fn invocation_builder_collects_args() {
        let mut inv = ToolInvocation::new(Tool::Ffmpeg);
        inv.arg("-y").args_from(["-i", "in.mkv"]);
        assert_eq!(inv.tool(), Tool::Ffmpeg);
        assert_eq!(inv.args(), ["-y", "-i", "in.mkv"]);
    }

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let runner = runner_for("nonexistent_tool_xyz_12345", DEFAULT_TIMEOUT);
        let err = runner
            .run(ToolInvocation::new(Tool::Ffmpeg))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let runner = runner_for("echo", DEFAULT_TIMEOUT);
        let mut inv = ToolInvocation::new(Tool::Ffprobe);
        inv.arg("hello");
        let out = runner.run(inv).await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_tool_failed() {
        let runner = runner_for("false", DEFAULT_TIMEOUT);
        let err = runner
            .run(ToolInvocation::new(Tool::Ffmpeg))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let runner = runner_for("sleep", Duration::from_millis(100));
        let mut inv = ToolInvocation::new(Tool::Ffmpeg);
        inv.arg("5");
        let err = runner.run(inv).await.unwrap_err();
        assert!(matches!(err, Error::ToolTimeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_runs_are_limited_by_permits() {
        // Each process holds a marker while it runs and logs how many
        // markers it saw.
        const SCRIPT: &str =
            r#"touch "$1/$$"; ls "$1" | wc -l >> "$1.log"; sleep 0.2; rm "$1/$$""#;

        let dir = std::env::temp_dir().join(format!("localflix-av-permits-{}", std::process::id()));
        let log = dir.with_extension("log");
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(&log);

        let runner = runner_for("sh", DEFAULT_TIMEOUT);
        let started = std::time::Instant::now();
        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let runner = runner.clone();
                let mut inv = ToolInvocation::new(Tool::Ffmpeg);
                inv.args_from(["-c", SCRIPT, "sh", dir.to_str().unwrap()]);
                tokio::spawn(async move { runner.run(inv).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let elapsed = started.elapsed();

        let counts: Vec<usize> = std::fs::read_to_string(&log)
            .unwrap()
            .lines()
            .map(|line| line.trim().parse().unwrap())
            .collect();
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::remove_file(&log).unwrap();

        assert_eq!(counts.len(), 6);
        assert!(counts.iter().all(|&n| (1..=2).contains(&n)), "{counts:?}");
        // Six runs through two permits take at least three rounds.
        assert!(elapsed >= Duration::from_millis(550), "{elapsed:?}");
    }
}
