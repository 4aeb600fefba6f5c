//! Entry-script dispatch with timeout and per-run records.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::registry_service::RegistryService;
use df_results::{DispatchLogs, DispatchManifest, DispatchStatus, DispatchStore};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to keep collecting output after a timeout kill.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Which script of a case to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunScript {
    /// Full mesh, set-fields and solve run; the name comes from configuration.
    #[default]
    Allrun,
    /// Batch-scheduler submission (`sub.sh`).
    Submit,
    /// Set-fields only (`set.sh`).
    SetFields,
}

impl RunScript {
    pub fn file_name<'a>(&self, config: &'a AppConfig) -> &'a str {
        match self {
            RunScript::Allrun => &config.entry_script,
            RunScript::Submit => "sub.sh",
            RunScript::SetFields => "set.sh",
        }
    }
}

/// Request to execute one case.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub case_name: &'a str,
    pub script: RunScript,
    /// Overrides the configured timeout.
    pub timeout: Option<Duration>,
}

impl<'a> RunRequest<'a> {
    pub fn new(case_name: &'a str) -> Self {
        Self {
            case_name,
            script: RunScript::default(),
            timeout: None,
        }
    }
}

/// Response from a successful dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub run_id: String,
    pub case_name: String,
    pub script: String,
    pub exit_code: Option<i32>,
    pub elapsed_s: f64,
    pub stdout: String,
    pub stderr: String,
    pub record_dir: PathBuf,
}

/// Captured result of a finished or killed process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub timed_out: bool,
}

/// Background reader for one output stream.
///
/// Bytes are shared as they arrive so a killed run still keeps what it printed.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl Drain {
    fn spawn<R: Read + Send + 'static>(stream: Option<R>) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        std::thread::spawn(move || {
            if let Some(mut stream) = stream {
                let mut chunk = [0u8; 8192];
                loop {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                    }
                }
            }
            let _ = tx.send(());
        });
        Self { buf, done }
    }

    /// Wait for end-of-stream until `deadline`; false if the stream is still open.
    fn wait_until(&self, deadline: Instant) -> bool {
        let remaining = deadline.saturating_duration_since(Instant::now());
        !matches!(self.done.recv_timeout(remaining), Err(RecvTimeoutError::Timeout))
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }
}

/// Kill the script's process group, including jobs it left in the background.
fn kill_group(pid: u32) {
    #[cfg(unix)]
    {
        let _ = Command::new("kill")
            .args(["-KILL", "--", &format!("-{pid}")])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    #[cfg(not(unix))]
    let _ = pid;
}

fn kill_tree(child: &mut Child) {
    kill_group(child.id());
    let _ = child.kill();
}

/// Run `script` through `shell` inside `dir`, killing it after `timeout`.
///
/// Output streams are drained concurrently so a chatty solver cannot block
/// on a full pipe. The deadline also covers background jobs that keep the
/// pipes open after the script itself has exited.
pub fn execute_script(
    shell: &str,
    dir: &Path,
    script: &str,
    timeout: Duration,
) -> AppResult<ProcessOutput> {
    if !dir.join(script).is_file() {
        return Err(AppError::ScriptNotFound {
            script: script.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    let start = Instant::now();
    let deadline = start + timeout;
    let mut cmd = Command::new(shell);
    cmd.arg(script)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn()?;
    let pid = child.id();
    info!(shell, script, dir = %dir.display(), pid, "spawned entry script");
    let stdout = Drain::spawn(child.stdout.take());
    let stderr = Drain::spawn(child.stderr.take());

    let mut timed_out = false;
    let status: Option<ExitStatus> = loop {
        if Instant::now() >= deadline {
            kill_tree(&mut child);
            timed_out = true;
            let _ = child.wait();
            break None;
        }
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill_tree(&mut child);
                let _ = child.wait();
                return Err(e.into());
            }
        }
    };

    if !timed_out && !(stdout.wait_until(deadline) && stderr.wait_until(deadline)) {
        warn!(script, pid, "background jobs still hold the output pipes at the deadline");
        kill_group(pid);
        timed_out = true;
    }
    if timed_out {
        // Processes outside the group may still hold the pipes.
        let grace = Instant::now() + DRAIN_GRACE;
        stdout.wait_until(grace);
        stderr.wait_until(grace);
    }

    let output = ProcessOutput {
        exit_code: status.and_then(|s| s.code()),
        stdout: stdout.text(),
        stderr: stderr.text(),
        elapsed: start.elapsed(),
        timed_out,
    };

    if timed_out {
        warn!(
            script,
            dir = %dir.display(),
            timeout_s = timeout.as_secs_f64(),
            "entry script timed out and was killed"
        );
    } else {
        info!(
            script,
            exit_code = output.exit_code.unwrap_or(-1),
            stdout_bytes = output.stdout.len() as u64,
            stderr_bytes = output.stderr.len() as u64,
            elapsed_ms = output.elapsed.as_millis() as u64,
            "entry script completed"
        );
    }
    Ok(output)
}

/// Execute a script in an explicit case directory and record the dispatch.
pub fn run_in_dir(
    config: &AppConfig,
    case_name: &str,
    case_dir: &Path,
    script: RunScript,
    timeout: Option<Duration>,
) -> AppResult<RunResponse> {
    let script_name = script.file_name(config);
    let timeout = timeout.unwrap_or(config.run_timeout);
    let timestamp = chrono::Utc::now().to_rfc3339();

    let output = execute_script(&config.shell, case_dir, script_name, timeout)?;

    let status = if output.timed_out {
        DispatchStatus::TimedOut
    } else {
        DispatchStatus::from_exit_code(output.exit_code)
    };
    let manifest = DispatchManifest {
        run_id: uuid::Uuid::new_v4().to_string(),
        case_name: case_name.to_string(),
        script: script_name.to_string(),
        timestamp,
        elapsed_s: output.elapsed.as_secs_f64(),
        exit_code: output.exit_code,
        status,
    };
    let logs = DispatchLogs {
        stdout: output.stdout,
        stderr: output.stderr,
    };
    let record_dir = DispatchStore::for_case(case_dir)?.save_run(&manifest, &logs)?;

    match status {
        DispatchStatus::TimedOut => Err(AppError::Timeout {
            script: script_name.to_string(),
            timeout_s: timeout.as_secs(),
        }),
        DispatchStatus::Failed => Err(AppError::ExecutionFailed {
            script: script_name.to_string(),
            exit_code: manifest.exit_code,
            stderr: logs.stderr,
        }),
        DispatchStatus::Succeeded => Ok(RunResponse {
            run_id: manifest.run_id,
            case_name: manifest.case_name,
            script: manifest.script,
            exit_code: manifest.exit_code,
            elapsed_s: manifest.elapsed_s,
            stdout: logs.stdout,
            stderr: logs.stderr,
            record_dir,
        }),
    }
}

/// Execute a registered case in its materialized directory. No retries.
pub fn run_case(config: &AppConfig, request: &RunRequest) -> AppResult<RunResponse> {
    RegistryService::new(config).get_case(request.case_name)?;
    let case_dir = config.case_dir(request.case_name);
    if !case_dir.is_dir() {
        return Err(AppError::CaseDirMissing { path: case_dir });
    }
    run_in_dir(
        config,
        request.case_name,
        &case_dir,
        request.script,
        request.timeout,
    )
}

/// Execute every registered case in parallel; one failure never stops the others.
pub fn run_all(
    config: &AppConfig,
    script: RunScript,
    timeout: Option<Duration>,
) -> AppResult<Vec<(String, AppResult<RunResponse>)>> {
    let registry = RegistryService::new(config).get()?;
    let names: Vec<String> = registry.run_cases.keys().cloned().collect();
    let outcomes: Vec<(String, AppResult<RunResponse>)> = names
        .into_par_iter()
        .map(|name| {
            let request = RunRequest {
                case_name: &name,
                script,
                timeout,
            };
            let result = run_case(config, &request);
            if let Err(e) = &result {
                warn!(case = %name, error = %e, "case dispatch failed");
            }
            (name, result)
        })
        .collect();
    Ok(outcomes)
}

fn existing_store(config: &AppConfig, case_name: &str) -> AppResult<DispatchStore> {
    let case_dir = config.case_dir(case_name);
    if !case_dir.is_dir() {
        return Err(AppError::CaseDirMissing { path: case_dir });
    }
    Ok(DispatchStore::for_case(&case_dir)?)
}

/// Recorded dispatches of a case, oldest first.
pub fn list_runs(config: &AppConfig, case_name: &str) -> AppResult<Vec<DispatchManifest>> {
    Ok(existing_store(config, case_name)?.list_runs()?)
}

/// One recorded dispatch with its captured output.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub manifest: DispatchManifest,
    pub logs: DispatchLogs,
}

/// Load a recorded dispatch; the most recent one when `run_id` is `None`.
pub fn load_run(config: &AppConfig, case_name: &str, run_id: Option<&str>) -> AppResult<RunRecord> {
    let store = existing_store(config, case_name)?;
    let manifest = match run_id {
        Some(run_id) => store.load_manifest(run_id)?,
        None => store
            .latest_run()?
            .ok_or_else(|| AppError::RunNotFound(format!("{case_name} (no recorded runs)")))?,
    };
    let logs = store.load_logs(&manifest.run_id)?;
    Ok(RunRecord { manifest, logs })
}
