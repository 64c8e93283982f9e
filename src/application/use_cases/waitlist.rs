use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::app_error::{AppError, StoreErrorKind};
use crate::application::messages::{self, Feedback};
use crate::domain::entities::email::{ValidationError, WaitlistEmail};
use crate::domain::entities::waitlist_entry::WaitlistEntry;

// ============================================================================
// Store Port
// ============================================================================

/// Capability set the controller needs from the hosted record store.
///
/// `exists` and `insert` never surface raw errors: implementations classify
/// and translate failures before returning.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Startup diagnostic. Failures are logged by the implementation.
    async fn probe(&self) -> bool;

    /// Whether `email` is already stored. `false` whenever the answer is
    /// unknown, so an unprovisioned backend never blocks a signup.
    async fn exists(&self, email: &WaitlistEmail) -> bool;

    async fn insert(&self, email: &WaitlistEmail) -> Result<InsertReceipt, StoreFailure>;
}

/// Where an insert landed and what the store returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertReceipt {
    pub table: String,
    pub entries: Vec<WaitlistEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Store(StoreErrorKind),
    Network,
    Unexpected,
}

/// A translated insert failure: category plus the sentence to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StoreFailure {
    pub fn unexpected() -> Self {
        Self {
            kind: FailureKind::Unexpected,
            message: messages::GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.kind == FailureKind::Store(StoreErrorKind::Duplicate)
    }
}

impl From<&AppError> for StoreFailure {
    fn from(err: &AppError) -> Self {
        let kind = match err {
            AppError::Store(store_err) => FailureKind::Store(store_err.kind),
            AppError::Network(_) => FailureKind::Network,
            _ => FailureKind::Unexpected,
        };
        Self {
            kind,
            message: err.user_message(),
        }
    }
}

// ============================================================================
// Submission State
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Checking,
    Inserting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub input: String,
    pub phase: SubmissionPhase,
}

impl SubmissionState {
    pub fn is_busy(&self) -> bool {
        self.phase != SubmissionPhase::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing happened.
    Ignored,
    Invalid(ValidationError),
    AlreadyRegistered,
    Success,
    Failure(StoreFailure),
}

impl SubmitOutcome {
    /// The alert to show, if any.
    pub fn feedback(&self) -> Option<Feedback> {
        match self {
            SubmitOutcome::Ignored => None,
            SubmitOutcome::Invalid(err) => Some(Feedback::error(err.to_string())),
            SubmitOutcome::AlreadyRegistered => Some(Feedback::already_registered()),
            SubmitOutcome::Success => Some(Feedback::success()),
            SubmitOutcome::Failure(failure) => Some(Feedback::error(failure.message.clone())),
        }
    }

    fn clears_input(&self) -> bool {
        matches!(self, SubmitOutcome::AlreadyRegistered | SubmitOutcome::Success)
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Owns the email input and the busy flag for one form instance.
///
/// At most one submission is in flight per controller; `submit` while busy
/// is a no-op.
pub struct SubmissionController {
    store: Arc<dyn WaitlistStore>,
    state: Arc<Mutex<SubmissionState>>,
}

impl SubmissionController {
    pub fn new(store: Arc<dyn WaitlistStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SubmissionState::default())),
        }
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.state).clone()
    }

    pub fn input(&self) -> String {
        lock(&self.state).input.clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).is_busy()
    }

    /// Keystroke handler. The field is read-only while busy; returns whether
    /// the edit was applied.
    pub fn set_input(&self, text: &str) -> bool {
        let mut state = lock(&self.state);
        if state.is_busy() {
            return false;
        }
        state.input = text.to_string();
        true
    }

    /// Validate, check for an existing entry, then insert.
    ///
    /// Validation failures never touch the store. The existence check always
    /// finishes before the insert starts. The busy flag is released on every
    /// exit, including a panic inside the store.
    #[instrument(skip_all)]
    pub async fn submit(&self, raw_input: &str) -> SubmitOutcome {
        let email = {
            let mut state = lock(&self.state);
            if state.is_busy() {
                debug!("submission already in flight, ignoring");
                return SubmitOutcome::Ignored;
            }
            state.input = raw_input.to_string();

            match WaitlistEmail::parse(raw_input) {
                Ok(email) => {
                    state.phase = SubmissionPhase::Checking;
                    email
                }
                Err(err) => {
                    debug!(reason = ?err, "rejected waitlist input");
                    return SubmitOutcome::Invalid(err);
                }
            }
        };

        let busy = BusyGuard {
            state: self.state.clone(),
        };
        let store = self.store.clone();
        let task_email = email.clone();

        // Spawned so a panicking store surfaces as a JoinError instead of
        // unwinding through the caller.
        let flow = tokio::spawn(async move {
            let outcome = run_flow(store.as_ref(), &busy.state, &task_email).await;
            if outcome.clears_input() {
                lock(&busy.state).input.clear();
            }
            outcome
        });

        match flow.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(email = %email, error = %err, "waitlist submission aborted");
                SubmitOutcome::Failure(StoreFailure::unexpected())
            }
        }
    }
}

async fn run_flow(
    store: &dyn WaitlistStore,
    state: &Mutex<SubmissionState>,
    email: &WaitlistEmail,
) -> SubmitOutcome {
    if store.exists(email).await {
        info!(email = %email, "email already on waitlist");
        return SubmitOutcome::AlreadyRegistered;
    }

    lock(state).phase = SubmissionPhase::Inserting;

    match store.insert(email).await {
        Ok(receipt) => {
            info!(email = %email, table = %receipt.table, "joined waitlist");
            SubmitOutcome::Success
        }
        Err(failure) => {
            warn!(
                email = %email,
                kind = ?failure.kind,
                message = %failure.message,
                "waitlist insert failed"
            );
            SubmitOutcome::Failure(failure)
        }
    }
}

/// Resets the phase to idle when the submission flow ends, however it ends.
struct BusyGuard {
    state: Arc<Mutex<SubmissionState>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        lock(&self.state).phase = SubmissionPhase::Idle;
    }
}

fn lock(state: &Mutex<SubmissionState>) -> MutexGuard<'_, SubmissionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
