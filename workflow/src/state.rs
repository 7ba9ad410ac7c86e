use crate::message::Transcript;
use crate::session::Session;
use helpdesk_backend_client::protocol::GuidedChoice;
use helpdesk_backend_client::protocol::SmartSummary;
use helpdesk_backend_client::protocol::SuggestionMetadata;
use helpdesk_backend_client::protocol::WorkflowAction;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

pub const MAX_CLARIFICATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[default]
    Idle,
    /// An initial message is with the backend.
    AwaitingAnalysis,
    AutoValidate,
    ConfirmSummary,
    AskClarification,
    TooVague,
    TopicShift,
    /// Ticket created, or the message was a greeting / not an IT problem.
    Terminal,
}

impl WorkflowStage {
    pub fn from_action(action: WorkflowAction) -> Self {
        match action {
            WorkflowAction::AutoValidate => Self::AutoValidate,
            WorkflowAction::ConfirmSummary => Self::ConfirmSummary,
            WorkflowAction::AskClarification => Self::AskClarification,
            WorkflowAction::TooVague => Self::TooVague,
            WorkflowAction::TopicShift => Self::TopicShift,
            WorkflowAction::Greeting | WorkflowAction::NonIt => Self::Terminal,
        }
    }

    /// Stages where the next user input starts a fresh analysis.
    pub fn accepts_new_message(self) -> bool {
        matches!(self, Self::Idle | Self::Terminal)
    }

    pub fn is_clarifying(self) -> bool {
        matches!(self, Self::AskClarification | Self::TooVague)
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingAnalysis => "awaiting_analysis",
            Self::AutoValidate => "auto_validate",
            Self::ConfirmSummary => "confirm_summary",
            Self::AskClarification => "ask_clarification",
            Self::TooVague => "too_vague",
            Self::TopicShift => "topic_shift",
            Self::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Questions left after the current one, given how many the backend
/// says it has already asked. The count comes off the wire unchecked.
pub fn remaining_clarification_attempts(attempts: u32) -> u32 {
    MAX_CLARIFICATION_ATTEMPTS.saturating_sub(attempts.saturating_add(1))
}

/// Everything a surface needs to render the conversation. Cloned out of
/// the tracker; mutating it has no effect on the tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSnapshot {
    pub stage: WorkflowStage,
    pub session: Option<Session>,
    pub pending_action: Option<WorkflowAction>,
    pub summary: Option<SmartSummary>,
    pub clarification_question: Option<String>,
    pub clarification_attempts: u32,
    pub guided_choices: Option<Vec<GuidedChoice>>,
    pub suggestion_metadata: Option<SuggestionMetadata>,
    pub show_examples: bool,
    pub transcript: Transcript,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl WorkflowSnapshot {
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn remaining_clarification_attempts(&self) -> u32 {
        remaining_clarification_attempts(self.clarification_attempts)
    }

    /// Drops everything tied to the current pending action.
    pub(crate) fn clear_pending(&mut self) {
        self.session = None;
        self.pending_action = None;
        self.summary = None;
        self.clarification_question = None;
        self.clarification_attempts = 0;
        self.guided_choices = None;
        self.suggestion_metadata = None;
        self.show_examples = false;
    }
}
