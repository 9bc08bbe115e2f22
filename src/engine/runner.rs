// Job lifecycle: spawn ffmpeg, drain its stderr on a background thread,
// deliver progress and log callbacks, coordinate cancellation.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::CompressError;
use super::options::CompressionOptions;
use super::plan::{self, ArgumentPlan};
use super::probe::MediaProbe;
use super::progress::{ProgressEvent, ProgressParser};
use super::tools::Tools;

/// How long a cancelled process gets to exit on SIGTERM before SIGKILL.
const CANCEL_GRACE: Duration = Duration::from_secs(5);
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// How many trailing stderr lines are kept for failure diagnostics.
const STDERR_TAIL_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

/// One request to transform one input file into one output file under
/// one set of options. Lives for a single subprocess invocation.
#[derive(Debug, Clone)]
pub struct CompressionJob {
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: CompressionOptions,
    /// Copied from the probe at launch time. 0.0 = unknown.
    pub duration_s: f64,
}

impl CompressionJob {
    pub fn new(
        input: PathBuf,
        output: PathBuf,
        options: CompressionOptions,
        probe: &MediaProbe,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            output,
            options,
            duration_s: probe.duration_s,
        }
    }
}

/// Success report for a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionSummary {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub reduction_pct: f64,
}

/// Size reduction as a percentage of the original.
pub fn reduction_pct(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

struct RunnerShared {
    state: Mutex<JobState>,
    cancel_requested: AtomicBool,
    child: Mutex<Option<Child>>,
}

/// Runs at most one compression job at a time.
///
/// The caller thread is never blocked: `start` spawns the subprocess,
/// hands its stderr to a reader thread, and returns a `JobHandle`.
/// Progress and log callbacks are invoked from the reader thread; the
/// caller marshals to its own context if needed.
pub struct JobRunner {
    tools: Tools,
    shared: Arc<RunnerShared>,
}

impl JobRunner {
    pub fn new(tools: Tools) -> Self {
        Self {
            tools,
            shared: Arc::new(RunnerShared {
                state: Mutex::new(JobState::Idle),
                cancel_requested: AtomicBool::new(false),
                child: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> JobState {
        *self.shared.state.lock().unwrap()
    }

    /// Launch a job. Fails synchronously with `AlreadyRunning` if one is
    /// in flight, `InvalidOptions` for bad options, and `EngineNotFound`
    /// if the engine binary is missing, all before any process spawns.
    pub fn start<P, L>(
        &self,
        job: CompressionJob,
        on_progress: P,
        on_log: L,
    ) -> Result<JobHandle, CompressError>
    where
        P: FnMut(ProgressEvent) + Send + 'static,
        L: FnMut(&str) + Send + 'static,
    {
        {
            let mut state = self.shared.state.lock().unwrap();
            if matches!(*state, JobState::Starting | JobState::Running) {
                return Err(CompressError::AlreadyRunning);
            }
            *state = JobState::Starting;
        }
        self.shared.cancel_requested.store(false, Ordering::SeqCst);

        match self.launch(&job) {
            Ok(child) => Ok(self.attach(job, child, on_progress, on_log)),
            Err(e) => {
                // Nothing spawned; the runner goes back to Idle.
                *self.shared.state.lock().unwrap() = JobState::Idle;
                Err(e)
            }
        }
    }

    fn launch(&self, job: &CompressionJob) -> Result<Child, CompressError> {
        let args = plan::encoder_args(&job.options)?;
        let plan = ArgumentPlan {
            args,
            duration_s: job.duration_s,
        };

        if !self.tools.ffmpeg.is_file() {
            return Err(CompressError::EngineNotFound(
                self.tools.ffmpeg.display().to_string(),
            ));
        }

        let mut cmd = plan.to_command(&self.tools.ffmpeg, &job.input, &job.output);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CompressError::EngineNotFound(self.tools.ffmpeg.display().to_string())
            } else {
                CompressError::Io(e)
            }
        })?;

        info!(job_id = %job.id, pid = child.id(), "spawned encoder");
        Ok(child)
    }

    fn attach<P, L>(&self, job: CompressionJob, mut child: Child, mut on_progress: P, mut on_log: L) -> JobHandle
    where
        P: FnMut(ProgressEvent) + Send + 'static,
        L: FnMut(&str) + Send + 'static,
    {
        let stderr = child.stderr.take();
        *self.shared.child.lock().unwrap() = Some(child);
        *self.shared.state.lock().unwrap() = JobState::Running;

        let shared = self.shared.clone();
        let job_id = job.id;
        let thread = thread::spawn(move || {
            let parser = ProgressParser::new(job.duration_s);
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            if let Some(stderr) = stderr {
                let reader = BufReader::new(stderr);
                for line in reader.lines().map_while(Result::ok) {
                    // The engine's own line is forwarded unmodified; the
                    // runner only prepends its own timestamp.
                    let stamped = format!("[{}] {}", Local::now().format("%H:%M:%S"), line);
                    on_log(&stamped);

                    if let Some(event) = parser.parse_line(&line) {
                        on_progress(event);
                    }

                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }

            // Stream closed; reap the process. Cancellation may hold the
            // child briefly for a kill, the mutex serializes that.
            let reaped = shared.child.lock().unwrap().take();
            let status = match reaped {
                Some(mut c) => c.wait(),
                None => Err(io::Error::other("child process handle missing")),
            };

            // Terminal transition happens under the state lock so a
            // concurrent cancel request either lands before it (and wins)
            // or observes a terminal state (and becomes a no-op).
            let mut state = shared.state.lock().unwrap();
            if shared.cancel_requested.load(Ordering::SeqCst) {
                info!(job_id = %job_id, "job cancelled");
                *state = JobState::Cancelled;
                return Err(CompressError::Cancelled);
            }

            match status {
                Ok(s) if s.success() => {
                    let summary = summarize(&job);
                    match summary {
                        Ok(summary) => {
                            debug!(job_id = %job_id, reduction_pct = summary.reduction_pct, "job completed");
                            *state = JobState::Completed;
                            Ok(summary)
                        }
                        Err(e) => {
                            *state = JobState::Failed;
                            Err(e)
                        }
                    }
                }
                Ok(s) => {
                    warn!(job_id = %job_id, status = %s, "encoder exited non-zero");
                    *state = JobState::Failed;
                    Err(CompressError::RunFailed {
                        exit_code: s.code(),
                        stderr_tail: tail.into_iter().collect::<Vec<_>>().join("\n"),
                    })
                }
                Err(e) => {
                    *state = JobState::Failed;
                    Err(CompressError::Io(e))
                }
            }
        });

        JobHandle { job_id, thread }
    }

    /// Request cancellation of the running job: graceful termination,
    /// a bounded grace period, then a hard kill. A no-op unless a job is
    /// `Running`; a process that already exited counts as a successful
    /// cancellation.
    pub fn cancel(&self) -> Result<(), CompressError> {
        {
            let state = self.shared.state.lock().unwrap();
            if *state != JobState::Running {
                return Ok(());
            }
            // Flag and signal are set under the state lock so they target
            // the exact process the reader thread is draining.
            self.shared.cancel_requested.store(true, Ordering::SeqCst);
            let mut child = self.shared.child.lock().unwrap();
            if let Some(child) = child.as_mut() {
                terminate_gracefully(child);
            }
        }

        let deadline = Instant::now() + CANCEL_GRACE;
        while Instant::now() < deadline {
            if self.state().is_terminal() {
                return Ok(());
            }
            thread::sleep(CANCEL_POLL);
        }

        warn!("grace period elapsed, force-killing encoder");
        if let Some(child) = self.shared.child.lock().unwrap().as_mut() {
            let _ = child.kill();
        }

        // SIGKILL closes the stderr pipe, so the reader thread reaps the
        // process and records the terminal state almost immediately. Wait
        // for that here, same as the graceful leg, so callers observing
        // `state()` after `cancel()` returns see a settled job.
        let deadline = Instant::now() + CANCEL_GRACE;
        while Instant::now() < deadline {
            if self.state().is_terminal() {
                break;
            }
            thread::sleep(CANCEL_POLL);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn terminate_gracefully(child: &mut Child) {
    // ESRCH here means the process already exited, which is fine.
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate_gracefully(child: &mut Child) {
    // No graceful signal off Unix; kill outright.
    let _ = child.kill();
}

fn summarize(job: &CompressionJob) -> Result<CompressionSummary, CompressError> {
    let original_bytes = fs::metadata(&job.input)?.len();
    let compressed_bytes = fs::metadata(&job.output)?.len();
    Ok(CompressionSummary {
        original_bytes,
        compressed_bytes,
        reduction_pct: reduction_pct(original_bytes, compressed_bytes),
    })
}

/// Handle to a launched job. `wait` joins the reader thread and yields
/// the terminal result.
#[derive(Debug)]
pub struct JobHandle {
    job_id: Uuid,
    thread: JoinHandle<Result<CompressionSummary, CompressError>>,
}

impl JobHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn wait(self) -> Result<CompressionSummary, CompressError> {
        self.thread
            .join()
            .unwrap_or_else(|_| Err(CompressError::Io(io::Error::other("reader thread panicked"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_reduction_pct_exact() {
        assert_eq!(reduction_pct(1_000_000, 400_000), 60.0);
        assert_eq!(reduction_pct(100, 100), 0.0);
        assert_eq!(reduction_pct(0, 0), 0.0, "zero original never divides");
    }

    #[test]
    fn test_reduction_pct_growth_is_negative() {
        assert_eq!(reduction_pct(100, 150), -50.0);
    }

    #[test]
    fn test_runner_starts_idle() {
        let tools = Tools::with_paths(PathBuf::from("/bin/missing"), PathBuf::from("/bin/missing"));
        let runner = JobRunner::new(tools);
        assert_eq!(runner.state(), JobState::Idle);
    }

    #[test]
    fn test_cancel_on_idle_runner_is_noop() {
        let tools = Tools::with_paths(PathBuf::from("/bin/missing"), PathBuf::from("/bin/missing"));
        let runner = JobRunner::new(tools);
        assert!(runner.cancel().is_ok());
        assert_eq!(runner.state(), JobState::Idle);
    }

    #[test]
    fn test_job_state_terminality() {
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::Starting.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }
}
