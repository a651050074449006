// Background worker that runs one ffmpeg encode

use anyhow::{Context, anyhow};
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::core::{
    EncodeError, EncodeJob, ProgressSample, ProgressTracker, QualityTier, Toolchain,
    normalize_subtitle, synthesize,
};
use super::probe::{MediaInfo, probe_media_info};
use crate::stats::OutputStats;

/// Lines of encoder output kept for failure reports
const STDERR_TAIL_LINES: usize = 10;

/// Message from the worker to the front-end loop
#[derive(Debug)]
pub enum WorkerMessage {
    /// ffmpeg was launched with this command line
    Started { job_id: Uuid, command: String },

    /// A progress sample was parsed from encoder output
    Progress { job_id: Uuid, sample: ProgressSample },

    /// Encode finished and the output exists
    Completed {
        job_id: Uuid,
        output: PathBuf,
        stats: Option<OutputStats>,
    },

    /// Encode failed
    Failed { job_id: Uuid, error: EncodeError },

    /// Encode stopped at the user's request
    Cancelled { job_id: Uuid },
}

impl WorkerMessage {
    pub fn job_id(&self) -> Uuid {
        match self {
            WorkerMessage::Started { job_id, .. }
            | WorkerMessage::Progress { job_id, .. }
            | WorkerMessage::Completed { job_id, .. }
            | WorkerMessage::Failed { job_id, .. }
            | WorkerMessage::Cancelled { job_id } => *job_id,
        }
    }

    /// Whether this is the last message of an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerMessage::Completed { .. }
                | WorkerMessage::Failed { .. }
                | WorkerMessage::Cancelled { .. }
        )
    }
}

/// Slot holding the running encoder process, shared with the canceller
type ChildSlot = Arc<Mutex<Option<Child>>>;

/// Cloneable handle that stops the running encode
#[derive(Debug, Clone)]
pub struct Canceller {
    requested: Arc<AtomicBool>,
    child: ChildSlot,
}

impl Canceller {
    fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            child: Arc::new(Mutex::new(None)),
        }
    }

    /// Request cancellation and signal the encoder if it is running.
    /// A request made before launch terminates the process right after spawn.
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
        if let Ok(mut slot) = self.child.lock() {
            if let Some(child) = slot.as_mut() {
                terminate(child);
            }
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Ask the encoder to stop. On Unix ffmpeg gets SIGTERM so it can finalize
/// the container; elsewhere the process is killed.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: kill(2) with a pid we spawned and have not yet reaped
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        debug!(pid, "SIGTERM failed, process probably exited");
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}

/// Handle to a spawned encode
pub struct EncodeHandle {
    job_id: Uuid,
    rx: Receiver<WorkerMessage>,
    canceller: Canceller,
    thread: Option<JoinHandle<()>>,
}

impl EncodeHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Get the receiver for worker messages
    pub fn receiver(&self) -> &Receiver<WorkerMessage> {
        &self.rx
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Wait for the worker thread to finish its cleanup
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(job_id = %self.job_id, "encode worker panicked");
            }
        }
    }
}

/// Spawn the worker thread for one encode
pub fn spawn_encode(job: EncodeJob, tools: Toolchain) -> EncodeHandle {
    let (tx, rx) = mpsc::channel();
    let canceller = Canceller::new();
    let job_id = job.id;

    let worker_canceller = canceller.clone();
    let thread = thread::spawn(move || {
        let message = match run_encode(&job, &tools, &worker_canceller, &tx) {
            Ok(Outcome::Completed(stats)) => WorkerMessage::Completed {
                job_id,
                output: job.output.clone(),
                stats,
            },
            Ok(Outcome::Cancelled) => WorkerMessage::Cancelled { job_id },
            Err(error) => {
                warn!(job_id = %job_id, "encode failed: {:#}", error);
                WorkerMessage::Failed { job_id, error }
            }
        };
        let _ = tx.send(message);
    });

    EncodeHandle {
        job_id,
        rx,
        canceller,
        thread: Some(thread),
    }
}

enum Outcome {
    Completed(Option<OutputStats>),
    Cancelled,
}

/// Probe the source. Failures leave duration and bitrate unknown.
fn probe_source(job: &EncodeJob, tools: &Toolchain) -> MediaInfo {
    match probe_media_info(&tools.ffprobe, &job.video) {
        Ok(info) => {
            debug!(duration_s = ?info.duration_s, bitrate = ?info.bitrate, "probed source");
            info
        }
        Err(e) => {
            warn!("probe failed, duration and bitrate unknown: {:#}", e);
            MediaInfo::default()
        }
    }
}

fn run_encode(
    job: &EncodeJob,
    tools: &Toolchain,
    canceller: &Canceller,
    tx: &Sender<WorkerMessage>,
) -> Result<Outcome, EncodeError> {
    let media = probe_source(job, tools);
    let source_bitrate = if job.quality == QualityTier::Original {
        media.bitrate
    } else {
        None
    };

    // Dropped on every return path below, which deletes the temporary copy
    let subtitle = normalize_subtitle(&job.subtitle)?;
    let request = job.request(subtitle.path().to_path_buf(), source_bitrate);
    let encode_cmd = synthesize(&request);
    let command_line = encode_cmd.display_with(&tools.ffmpeg);
    info!(job_id = %job.id, "Command: {}", command_line);

    if canceller.is_requested() {
        return Ok(Outcome::Cancelled);
    }

    let mut child = match encode_cmd.command(&tools.ffmpeg).spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EncodeError::ToolNotFound {
                program: tools.ffmpeg.clone(),
            });
        }
        Err(e) => return Err(anyhow!(e).context("Failed to spawn ffmpeg").into()),
    };

    let stdout = child.stdout.take().context("Failed to capture stdout")?;
    let stderr = child.stderr.take().context("Failed to capture stderr")?;
    {
        let mut slot = canceller
            .child
            .lock()
            .map_err(|_| anyhow!("encoder slot poisoned"))?;
        if canceller.is_requested() {
            terminate(&mut child);
        }
        *slot = Some(child);
    }

    let _ = tx.send(WorkerMessage::Started {
        job_id: job.id,
        command: command_line,
    });

    let tracker = ProgressTracker::new(media.duration_s);
    let (line_tx, line_rx) = mpsc::channel::<String>();
    let readers = [
        spawn_line_reader(stdout, line_tx.clone()),
        spawn_line_reader(stderr, line_tx),
    ];

    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    for line in line_rx {
        debug!(target: "ffmpeg", "{}", line);
        if let Some(sample) = tracker.observe(&line) {
            let _ = tx.send(WorkerMessage::Progress {
                job_id: job.id,
                sample,
            });
        } else if !is_progress_key(&line) {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }
    for reader in readers {
        let _ = reader.join();
    }

    let status = wait_for_exit(canceller)?;
    let elapsed = tracker.elapsed();

    if canceller.is_requested() {
        info!(job_id = %job.id, "encode cancelled, keeping partial output {}", job.output.display());
        return Ok(Outcome::Cancelled);
    }

    if !status.success() {
        remove_partial_output(job);
        return Err(EncodeError::EncoderFailed {
            status,
            stderr_tail: tail.into_iter().collect::<Vec<_>>().join("\n"),
        });
    }

    if !job.output.exists() {
        return Err(anyhow!("Output file not created: {}", job.output.display()).into());
    }

    let stats = match OutputStats::from_paths(&job.video, &job.output, elapsed) {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("could not compute output stats: {:#}", e);
            None
        }
    };

    if let Err(e) = subtitle.close() {
        warn!("{:#}", e);
    }
    info!(job_id = %job.id, "encoded {}", job.output.display());
    Ok(Outcome::Completed(stats))
}

fn wait_for_exit(canceller: &Canceller) -> Result<ExitStatus, EncodeError> {
    let mut slot = canceller
        .child
        .lock()
        .map_err(|_| anyhow!("encoder slot poisoned"))?;
    let mut child = slot.take().context("Encoder process missing")?;
    drop(slot);
    Ok(child.wait().context("Failed to wait for ffmpeg")?)
}

/// `-progress` emits other `key=value` lines besides the time markers
fn is_progress_key(line: &str) -> bool {
    line.split_once('=').is_some_and(|(key, _)| {
        !key.is_empty() && key.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    })
}

fn remove_partial_output(job: &EncodeJob) {
    if !job.output.exists() {
        return;
    }
    match fs::remove_file(&job.output) {
        Ok(()) => debug!("removed partial output {}", job.output.display()),
        Err(e) => warn!(
            "failed to remove partial output {}: {}",
            job.output.display(),
            e
        ),
    }
}

/// Forward lines from a pipe into `tx`. ffmpeg ends stats lines with `\r`,
/// so both `\r` and `\n` terminate a line; empty lines are skipped.
fn spawn_line_reader<R: Read + Send + 'static>(pipe: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let _ = for_each_line(pipe, |line| {
            let _ = tx.send(line);
        });
    })
}

pub(crate) fn for_each_line<R: Read>(pipe: R, mut f: impl FnMut(String)) -> io::Result<()> {
    let mut reader = BufReader::new(pipe);
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        let len = buf.len();
        for &byte in buf {
            if byte == b'\n' || byte == b'\r' {
                if !pending.is_empty() {
                    f(String::from_utf8_lossy(&pending).into_owned());
                    pending.clear();
                }
            } else {
                pending.push(byte);
            }
        }
        reader.consume(len);
    }

    if !pending.is_empty() {
        f(String::from_utf8_lossy(&pending).into_owned());
    }
    Ok(())
}
