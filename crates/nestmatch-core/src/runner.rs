//! Async driver around one [`SurveySession`].
//!
//! The runner owns the pacing delay between an answer and the next question
//! and dispatches the submission without awaiting it. The session is already
//! `Completed` when the network call starts, and a failed submission only
//! gets logged.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use nestmatch_gateway::SubmissionGateway;
use nestmatch_schema::{AnswerValue, ChatMessage, Submission, SurveyAnswerMap};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::SurveyError;
use crate::session::{Advance, SessionState, SurveySession};

pub const DEFAULT_PACING: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Answer recorded; the next question appears after the pacing delay.
    NextQuestionPending,
    /// Survey finished; the submission is in flight.
    Completed,
}

/// Point-in-time copy of a session for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub question_index: usize,
    pub answered: usize,
    pub total: usize,
    pub answers: SurveyAnswerMap,
    pub transcript: Vec<ChatMessage>,
}

pub struct SurveyRunner {
    session: Arc<Mutex<SurveySession>>,
    gateway: Arc<dyn SubmissionGateway>,
    pacing: Duration,
    next_question: StdMutex<Option<JoinHandle<()>>>,
    submission: StdMutex<Option<JoinHandle<Result<()>>>>,
}

impl SurveyRunner {
    pub fn new(session: SurveySession, gateway: Arc<dyn SubmissionGateway>, pacing: Duration) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            gateway,
            pacing,
            next_question: StdMutex::new(None),
            submission: StdMutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<(), SurveyError> {
        self.session.lock().await.start()
    }

    pub async fn select_option(&self, value: &AnswerValue) -> Result<StepOutcome, SurveyError> {
        let advance = self.session.lock().await.select_option(value)?;
        match advance {
            Advance::NextQuestionPending => {
                self.schedule_next_question();
                Ok(StepOutcome::NextQuestionPending)
            }
            Advance::Completed(submission) => {
                self.dispatch_submission(submission);
                Ok(StepOutcome::Completed)
            }
        }
    }

    pub async fn back(&self) -> Result<(), SurveyError> {
        self.session.lock().await.back()
    }

    pub async fn is_complete(&self) -> bool {
        self.session.lock().await.is_complete()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        let (answered, total) = session.progress();
        SessionSnapshot {
            session_id: session.id(),
            state: session.state(),
            question_index: session.question_index(),
            answered,
            total,
            answers: session.answers().clone(),
            transcript: session.transcript().to_vec(),
        }
    }

    /// Wait until a pending next-question append has landed. Returns at once
    /// if nothing is pending.
    pub async fn wait_for_next_question(&self) {
        let handle = take_handle(&self.next_question);
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "next-question task did not finish");
            }
        }
    }

    /// Wait for the in-flight submission, if any, and return its outcome.
    /// The session state does not depend on this result.
    pub async fn wait_for_submission(&self) -> Option<Result<()>> {
        let handle = take_handle(&self.submission)?;
        Some(match handle.await {
            Ok(result) => result,
            Err(err) => Err(anyhow!("submission task failed: {err}")),
        })
    }

    fn schedule_next_question(&self) {
        let session = Arc::clone(&self.session);
        let pacing = self.pacing;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(pacing).await;
            let mut session = session.lock().await;
            if let Err(err) = session.present_next_question() {
                tracing::debug!(session_id = %session.id(), error = %err, "next question dropped");
            }
        });
        store_handle(&self.next_question, handle);
    }

    fn dispatch_submission(&self, submission: Submission) {
        let gateway = Arc::clone(&self.gateway);
        let handle = tokio::spawn(async move {
            let uid = submission.identity.uid.clone();
            let result = gateway.submit(submission).await;
            if let Err(err) = &result {
                tracing::warn!(%uid, error = %err, "survey submission failed; session stays completed");
            }
            result
        });
        store_handle(&self.submission, handle);
    }
}

fn store_handle<T>(slot: &StdMutex<Option<JoinHandle<T>>>, handle: JoinHandle<T>) {
    match slot.lock() {
        Ok(mut guard) => *guard = Some(handle),
        Err(poisoned) => *poisoned.into_inner() = Some(handle),
    }
}

fn take_handle<T>(slot: &StdMutex<Option<JoinHandle<T>>>) -> Option<JoinHandle<T>> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}
