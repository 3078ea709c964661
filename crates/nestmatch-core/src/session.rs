//! Survey dialogue state machine.
//!
//! `NotStarted -> InProgress -> Completed`. Every answered question pushes a
//! checkpoint; stepping back pops one and restores the transcript and answer
//! map to where they stood when that question was still open.

use std::sync::Arc;

use chrono::Utc;
use nestmatch_schema::{
    AnswerValue, ChatMessage, Identity, Role, Submission, SurveyAnswerMap, SurveyOption,
    SurveyQuestion,
};
use uuid::Uuid;

use crate::error::SurveyError;
use crate::script::SurveyScript;

pub const DEFAULT_WELCOME: &str = "Hi! I'm so excited to help you find your perfect roommate. \
Let's start with a few quick questions about your lifestyle.";
pub const DEFAULT_COMPLETION: &str =
    "Thanks! Your answers are saved. We'll use them to find roommates who fit your lifestyle.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// Fixed assistant lines that open and close the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrompts {
    pub welcome: String,
    pub completion: String,
}

impl Default for SessionPrompts {
    fn default() -> Self {
        Self {
            welcome: DEFAULT_WELCOME.to_string(),
            completion: DEFAULT_COMPLETION.to_string(),
        }
    }
}

/// What a successful `select_option` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The answer was recorded; the next question must be presented with
    /// [`SurveySession::present_next_question`] once the pacing delay ends.
    NextQuestionPending,
    /// That was the last question. The submission is produced exactly once.
    Completed(Submission),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Checkpoint {
    transcript_len: usize,
    answers_len: usize,
    field: String,
}

#[derive(Debug, Clone)]
pub struct SurveySession {
    id: Uuid,
    script: Arc<SurveyScript>,
    identity: Identity,
    prompts: SessionPrompts,
    state: SessionState,
    question_index: usize,
    answers: SurveyAnswerMap,
    transcript: Vec<ChatMessage>,
    checkpoints: Vec<Checkpoint>,
    question_pending: bool,
    next_message_id: u64,
}

impl SurveySession {
    pub fn new(script: Arc<SurveyScript>, identity: Identity) -> Self {
        Self::with_prompts(script, identity, SessionPrompts::default())
    }

    pub fn with_prompts(
        script: Arc<SurveyScript>,
        identity: Identity,
        prompts: SessionPrompts,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            script,
            identity,
            prompts,
            state: SessionState::NotStarted,
            question_index: 0,
            answers: SurveyAnswerMap::new(),
            transcript: Vec::new(),
            checkpoints: Vec::new(),
            question_pending: false,
            next_message_id: 1,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn question_count(&self) -> usize {
        self.script.len()
    }

    pub fn current_question(&self) -> Option<&SurveyQuestion> {
        match self.state {
            SessionState::NotStarted => None,
            _ => self.script.question(self.question_index),
        }
    }

    pub fn answers(&self) -> &SurveyAnswerMap {
        &self.answers
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// True while the next question is recorded but not yet shown.
    pub fn is_question_pending(&self) -> bool {
        self.question_pending
    }

    /// True when the last message is an open question.
    pub fn is_awaiting_answer(&self) -> bool {
        self.state == SessionState::InProgress
            && self
                .transcript
                .last()
                .is_some_and(ChatMessage::is_awaiting_reply)
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.answers.len(), self.script.len())
    }

    pub fn start(&mut self) -> Result<(), SurveyError> {
        if self.state != SessionState::NotStarted {
            return Err(SurveyError::AlreadyStarted);
        }

        let welcome = self.prompts.welcome.clone();
        self.push_message(Role::Assistant, welcome, None);
        self.push_question(0);
        self.state = SessionState::InProgress;

        tracing::info!(session_id = %self.id, questions = self.script.len(), "survey started");
        Ok(())
    }

    pub fn select_option(&mut self, value: &AnswerValue) -> Result<Advance, SurveyError> {
        match self.state {
            SessionState::NotStarted => {
                return Err(SurveyError::not_accepting("survey has not started"))
            }
            SessionState::Completed => {
                return Err(SurveyError::not_accepting("survey already completed"))
            }
            SessionState::InProgress => {}
        }
        if !self.is_awaiting_answer() {
            return Err(SurveyError::not_accepting("waiting for the next question"));
        }

        let question = self
            .script
            .question(self.question_index)
            .ok_or_else(|| SurveyError::invalid_operation("question index out of range"))?;
        let option = question
            .option_for(value)
            .ok_or_else(|| SurveyError::InvalidOption {
                question_id: question.id.clone(),
                value: value.clone(),
            })?;
        let field = question.field.clone();
        let label = option.label.clone();

        self.checkpoints.push(Checkpoint {
            transcript_len: self.transcript.len(),
            answers_len: self.answers.len(),
            field: field.clone(),
        });
        if let Some(open_question) = self.transcript.last_mut() {
            open_question.options = None;
        }
        self.push_message(Role::User, label, None);
        self.answers.insert(field.clone(), value.clone());

        tracing::debug!(
            session_id = %self.id,
            field = %field,
            value = %value,
            index = self.question_index,
            "answer recorded"
        );

        if self.question_index + 1 < self.script.len() {
            self.question_index += 1;
            self.question_pending = true;
            return Ok(Advance::NextQuestionPending);
        }

        self.state = SessionState::Completed;
        let completion = self.prompts.completion.clone();
        self.push_message(Role::Assistant, completion, None);
        tracing::info!(session_id = %self.id, answers = self.answers.len(), "survey completed");

        Ok(Advance::Completed(Submission {
            identity: self.identity.clone(),
            responses: self.answers.clone(),
        }))
    }

    /// Append the question that `select_option` left pending.
    pub fn present_next_question(&mut self) -> Result<(), SurveyError> {
        if self.state != SessionState::InProgress || !self.question_pending {
            return Err(SurveyError::invalid_operation("no question is pending"));
        }
        self.push_question(self.question_index);
        self.question_pending = false;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), SurveyError> {
        match self.state {
            SessionState::NotStarted => {
                return Err(SurveyError::invalid_operation("survey has not started"))
            }
            SessionState::Completed => {
                return Err(SurveyError::not_accepting("survey already completed"))
            }
            SessionState::InProgress => {}
        }
        if self.question_pending {
            return Err(SurveyError::not_accepting("waiting for the next question"));
        }
        if self.question_index == 0 {
            return Err(SurveyError::invalid_operation("already at the first question"));
        }
        let Some(checkpoint) = self.checkpoints.pop() else {
            return Err(SurveyError::invalid_operation("no answered question to return to"));
        };

        self.question_index -= 1;
        self.transcript.truncate(checkpoint.transcript_len);
        self.answers.remove(&checkpoint.field);
        debug_assert_eq!(self.answers.len(), checkpoint.answers_len);

        let options = self
            .script
            .question(self.question_index)
            .map(|q| q.options.clone());
        if let Some(reopened) = self.transcript.last_mut() {
            reopened.options = options;
        }

        tracing::debug!(
            session_id = %self.id,
            field = %checkpoint.field,
            index = self.question_index,
            "stepped back"
        );
        Ok(())
    }

    fn push_question(&mut self, index: usize) {
        let Some(question) = self.script.question(index) else {
            return;
        };
        let content = question.question.clone();
        let options = question.options.clone();
        self.push_message(Role::Assistant, content, Some(options));
    }

    fn push_message(&mut self, role: Role, content: String, options: Option<Vec<SurveyOption>>) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.transcript.push(ChatMessage {
            id,
            role,
            content,
            timestamp: Utc::now(),
            options,
        });
    }
}
