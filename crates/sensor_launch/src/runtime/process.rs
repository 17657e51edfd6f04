//! Supervisor that spawns launch requests as child processes

use crate::config::{LaunchRequest, OutputMode, PackageLocator};
use crate::runtime::walker::ProcessSupervisor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Upper bound on waiting for output readers once their process has exited
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Program and arguments for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Build the command line for `request`.
    ///
    /// Executables of a package found by `locator` run from
    /// `<prefix>/lib/<package>/`; anything else is looked up on `PATH`.
    /// Parameters are appended as `--ros-args -p name:=value`.
    pub fn for_request(request: &LaunchRequest, locator: Option<&dyn PackageLocator>) -> Self {
        let program = match (&request.package, locator) {
            (Some(package), Some(locator)) if !request.executable.contains('/') => locator
                .lib_directory(package)
                .map(|lib| lib.join(&request.executable))
                .ok()
                .filter(|candidate| candidate.is_file())
                .unwrap_or_else(|| PathBuf::from(&request.executable)),
            _ => PathBuf::from(&request.executable),
        };

        let mut args = request.args.clone();
        if !request.parameters.is_empty() {
            args.push("--ros-args".to_string());
            for (key, value) in &request.parameters {
                args.push("-p".to_string());
                args.push(format!("{}:={}", key, value));
            }
        }

        Self { program, args }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Process status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    /// Process has stopped with exit code
    Stopped(Option<i32>),
}

impl ProcessStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }
}

/// Event emitted by a spawned process
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// Process output line; `echo` is false for log-only output
    Output {
        line: String,
        is_stderr: bool,
        echo: bool,
    },
}

/// A spawned child process
#[derive(Debug)]
pub struct SpawnedProcess {
    /// Unique name: label plus launch sequence number
    pub name: String,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    /// Output lines logged so far
    pub output_lines: usize,
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
}

impl SpawnedProcess {
    /// Poll the child without blocking
    fn check_status(&mut self) -> ProcessStatus {
        if let Some(child) = &mut self.child {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let code = status.code();
                    log::info!("[{}] Process exited with code: {:?}", self.name, code);
                    self.status = ProcessStatus::Stopped(code);
                    self.pid = None;
                    self.child = None;
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("[{}] Error checking process status: {}", self.name, e);
                }
            }
        }
        self.status
    }

    /// SIGTERM, then kill once `timeout` passes
    async fn stop(&mut self, timeout: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        log::info!("[{}] Stopping process...", self.name);

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.pid.and_then(|pid| i32::try_from(pid).ok()) {
                let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                self.status = ProcessStatus::Stopped(status.code());
                log::info!("[{}] Process exited with code: {:?}", self.name, status.code());
            }
            Ok(Err(e)) => {
                log::error!("[{}] Error waiting for process: {}", self.name, e);
                self.status = ProcessStatus::Stopped(None);
            }
            Err(_) => {
                log::warn!(
                    "[{}] Process did not exit gracefully, forcing kill",
                    self.name
                );
                let _ = child.kill().await;
                self.status = ProcessStatus::Stopped(None);
            }
        }
        self.pid = None;
    }
}

/// Spawns every submitted request immediately.
///
/// Processes are never restarted. Spawn failures are logged and counted so
/// the caller can decide the exit status.
pub struct ProcessSpawner {
    locator: Option<Box<dyn PackageLocator>>,
    processes: Vec<SpawnedProcess>,
    failures: Vec<String>,
    event_tx: mpsc::UnboundedSender<(String, ProcessEvent)>,
    event_rx: mpsc::UnboundedReceiver<(String, ProcessEvent)>,
}

impl Default for ProcessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSpawner {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            locator: None,
            processes: Vec::new(),
            failures: Vec::new(),
            event_tx,
            event_rx,
        }
    }

    /// Resolve package executables through `locator`
    pub fn with_locator(mut self, locator: impl PackageLocator + 'static) -> Self {
        self.locator = Some(Box::new(locator));
        self
    }

    pub fn processes(&self) -> &[SpawnedProcess] {
        &self.processes
    }

    /// Names of requests that could not be spawned
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Error summarising spawn failures, if there were any
    pub fn check(&self) -> Result<(), ProcessError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ProcessError::SpawnFailed(self.failures.clone()))
        }
    }

    fn spawn(&self, name: &str, request: &LaunchRequest) -> std::io::Result<SpawnedProcess> {
        let command = CommandLine::for_request(request, self.locator.as_deref());
        log::info!("[{}] Starting: {}", name, command);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        log::info!("[{}] Process started with PID: {:?}", name, pid);

        let echo = request.output != OutputMode::Log;
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(
                name.to_string(),
                stdout,
                false,
                echo,
                self.event_tx.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(
                name.to_string(),
                stderr,
                true,
                echo,
                self.event_tx.clone(),
            ));
        }

        Ok(SpawnedProcess {
            name: name.to_string(),
            pid,
            status: ProcessStatus::Running,
            output_lines: 0,
            child: Some(child),
            readers,
        })
    }

    /// Wait for all processes to exit or a shutdown signal
    pub async fn wait(&mut self, mut shutdown_rx: watch::Receiver<()>) {
        loop {
            if self
                .processes
                .iter_mut()
                .all(|process| !process.check_status().is_running())
            {
                self.drain_output().await;
                log::info!("All processes have stopped");
                break;
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    log::info!("Shutdown signal received");
                    break;
                }

                event = self.event_rx.recv() => {
                    if let Some((name, event)) = event {
                        self.log_event(&name, event);
                    }
                }

                _ = tokio::time::sleep(Duration::from_millis(500)) => {}
            }
        }
    }

    /// Stop all processes in reverse launch order
    pub async fn shutdown(&mut self, timeout: Duration) {
        log::info!("Shutting down all processes...");
        for process in self.processes.iter_mut().rev() {
            if process.check_status().is_running() {
                process.stop(timeout).await;
            }
        }
        self.drain_output().await;
        log::info!("All processes shut down");
    }

    /// Log everything stopped processes wrote before exiting.
    ///
    /// Readers of exited processes are awaited first so their last lines are
    /// in the channel before it is emptied.
    async fn drain_output(&mut self) {
        let mut readers = Vec::new();
        for process in &mut self.processes {
            if !process.status.is_running() {
                readers.append(&mut process.readers);
            }
        }
        for reader in readers {
            if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, reader).await.is_err() {
                log::warn!("Output reader still open after process exit, not waiting further");
            }
        }

        while let Ok((name, event)) = self.event_rx.try_recv() {
            self.log_event(&name, event);
        }
    }

    fn log_event(&mut self, name: &str, event: ProcessEvent) {
        let ProcessEvent::Output {
            line,
            is_stderr,
            echo,
        } = event;
        match (echo, is_stderr) {
            (true, true) => log::warn!("[{}] {}", name, line),
            (true, false) => log::info!("[{}] {}", name, line),
            (false, _) => log::debug!("[{}] {}", name, line),
        }
        if let Some(process) = self.processes.iter_mut().find(|p| p.name == name) {
            process.output_lines += 1;
        }
    }
}

impl ProcessSupervisor for ProcessSpawner {
    fn submit(&mut self, request: LaunchRequest) {
        let sequence = self.processes.len() + self.failures.len() + 1;
        let name = format!("{}-{}", request.label(), sequence);

        match self.spawn(&name, &request) {
            Ok(process) => self.processes.push(process),
            Err(e) => {
                log::error!("[{}] Failed to spawn process: {}", name, e);
                self.failures.push(name);
            }
        }
    }
}

fn forward_lines<R>(
    name: String,
    reader: R,
    is_stderr: bool,
    echo: bool,
    tx: mpsc::UnboundedSender<(String, ProcessEvent)>,
) -> JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = ProcessEvent::Output {
                line,
                is_stderr,
                echo,
            };
            if tx.send((name.clone(), event)).is_err() {
                break;
            }
        }
    })
}

/// Errors reported by the spawning supervisor
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to spawn {}: {}", .0.len(), .0.join(", "))]
    SpawnFailed(Vec<String>),
}
