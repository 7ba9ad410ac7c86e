//! Request and response bodies of the `/api/v1/workflow` endpoints.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const ANALYZE_PATH: &str = "/analyze";
pub const AUTO_VALIDATE_PATH: &str = "/auto-validate";
pub const CONFIRM_SUMMARY_PATH: &str = "/confirm-summary";
pub const CLARIFY_PATH: &str = "/clarify";
pub const TOPIC_SHIFT_CHOICE_PATH: &str = "/topic-shift-choice";

const TICKET_CREATED_TYPE: &str = "ticket_created";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AutoValidateRequest {
    pub session_id: String,
    pub user_response: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfirmSummaryRequest {
    pub session_id: String,
    pub user_action: SummaryDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Modifications>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClarifyRequest {
    pub session_id: String,
    pub clarification_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_choice_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopicShiftRequest {
    pub session_id: String,
    pub choice: TopicShiftChoice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryDecision {
    Confirm,
    Modify,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TopicShiftChoice {
    /// Drop the original problem and continue with the new one.
    KeepNew,
    /// Ignore the digression and return to the original problem.
    KeepOld,
    /// File a single ticket covering both.
    BothProblems,
}

impl TopicShiftChoice {
    pub const ALL: [TopicShiftChoice; 3] = [Self::KeepNew, Self::KeepOld, Self::BothProblems];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepNew => "keep_new",
            Self::KeepOld => "keep_old",
            Self::BothProblems => "both_problems",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.as_str() == value.trim())
    }
}

impl fmt::Display for TopicShiftChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only fields a user may change on a proposed summary. Category and
/// priority are decided by the backend and never sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
}

impl Modifications {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.symptoms.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    AutoValidate,
    ConfirmSummary,
    AskClarification,
    TooVague,
    Greeting,
    NonIt,
    TopicShift,
}

impl WorkflowAction {
    /// Greeting and non-IT replies end the exchange without a session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Greeting | Self::NonIt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoValidate => "auto_validate",
            Self::ConfirmSummary => "confirm_summary",
            Self::AskClarification => "ask_clarification",
            Self::TooVague => "too_vague",
            Self::Greeting => "greeting",
            Self::NonIt => "non_it",
            Self::TopicShift => "topic_shift",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Structured extraction of ticket fields proposed by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SmartSummary {
    #[serde(default)]
    pub category: Option<CategorySummary>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symptoms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_info: BTreeMap<String, serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_info: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuidedChoice {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionMetadata {
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub should_regenerate: bool,
    #[serde(default)]
    pub regeneration_reason: Option<String>,
    #[serde(default = "default_relevance_score")]
    pub relevance_score: f64,
}

fn default_relevance_score() -> f64 {
    100.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    pub action: WorkflowAction,
    pub message: String,
    #[serde(default)]
    pub summary: Option<SmartSummary>,
    #[serde(default)]
    pub clarification_questions: Option<Vec<String>>,
    #[serde(default)]
    pub clarification_attempts: u32,
    #[serde(default)]
    pub guided_choices: Option<Vec<GuidedChoice>>,
    #[serde(default)]
    pub suggestion_metadata: Option<SuggestionMetadata>,
    #[serde(default)]
    pub show_examples: Option<bool>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl AnalysisResponse {
    /// The question to put in front of the user: the one embedded in the
    /// summary wins, otherwise the first targeted question.
    pub fn clarification_question(&self) -> Option<&str> {
        self.summary
            .as_ref()
            .and_then(|summary| summary.clarification_question.as_deref())
            .or_else(|| {
                self.clarification_questions
                    .as_ref()
                    .and_then(|questions| questions.first())
                    .map(String::as_str)
            })
    }
}

/// Payload returned once the backend has filed the ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketRecord {
    pub ticket_id: i64,
    pub ticket_number: String,
    #[serde(default)]
    pub glpi_ticket_id: Option<i64>,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub category_name: String,
    pub created_at: String,
    #[serde(rename = "ready_for_L1", default)]
    pub ready_for_l1: bool,
    #[serde(rename = "synced_to_glpi", default, deserialize_with = "null_as_default")]
    pub synced_to_external_system: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub escalated_to_human: bool,
    pub message: String,
}

/// Any endpoint that can either continue the conversation or finish it.
///
/// The backend distinguishes the two by the body's `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowReply {
    Analysis(AnalysisResponse),
    TicketCreated(TicketRecord),
}

impl<'de> Deserialize<'de> for WorkflowReply {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let is_ticket = value.get("type").and_then(serde_json::Value::as_str)
            == Some(TICKET_CREATED_TYPE);
        if is_ticket {
            serde_json::from_value(value)
                .map(WorkflowReply::TicketCreated)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(WorkflowReply::Analysis)
                .map_err(D::Error::custom)
        }
    }
}

impl From<TicketRecord> for WorkflowReply {
    fn from(record: TicketRecord) -> Self {
        Self::TicketCreated(record)
    }
}

impl From<AnalysisResponse> for WorkflowReply {
    fn from(response: AnalysisResponse) -> Self {
        Self::Analysis(response)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
