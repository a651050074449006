use super::error::TransitionError;
use super::progress::ProgressSample;
use uuid::Uuid;

/// Lifecycle of the single in-flight encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running { job_id: Uuid },
    Cancelling { job_id: Uuid },
}

/// Front-end view of the encode: state plus the latest progress sample.
///
/// Transitions: `start` (Idle -> Running), `cancel` (Running -> Cancelling),
/// `process_exited` (Running | Cancelling -> Idle).
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    latest: Option<ProgressSample>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    pub fn latest(&self) -> Option<&ProgressSample> {
        self.latest.as_ref()
    }

    pub fn start(&mut self, job_id: Uuid) -> Result<(), TransitionError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Running { job_id };
                self.latest = None;
                Ok(())
            }
            SessionState::Running { job_id: busy } | SessionState::Cancelling { job_id: busy } => {
                Err(TransitionError::Busy(busy))
            }
        }
    }

    pub fn cancel(&mut self) -> Result<Uuid, TransitionError> {
        match self.state {
            SessionState::Running { job_id } => {
                self.state = SessionState::Cancelling { job_id };
                Ok(job_id)
            }
            SessionState::Cancelling { job_id } => Err(TransitionError::AlreadyCancelling(job_id)),
            SessionState::Idle => Err(TransitionError::NotRunning),
        }
    }

    /// The encoder process is gone (success, failure or cancel)
    pub fn process_exited(&mut self) -> Result<Uuid, TransitionError> {
        match self.state {
            SessionState::Running { job_id } | SessionState::Cancelling { job_id } => {
                self.state = SessionState::Idle;
                Ok(job_id)
            }
            SessionState::Idle => Err(TransitionError::NotRunning),
        }
    }

    /// Replace the latest sample. Ignored while idle.
    pub fn record(&mut self, sample: ProgressSample) {
        if self.is_busy() {
            self.latest = Some(sample);
        }
    }
}
