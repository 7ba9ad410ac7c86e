use chrono::DateTime;
use chrono::Utc;
use helpdesk_backend_client::protocol::GuidedChoice;
use helpdesk_backend_client::protocol::SmartSummary;
use helpdesk_backend_client::protocol::SuggestionMetadata;
use helpdesk_backend_client::protocol::TicketRecord;
use helpdesk_backend_client::protocol::WorkflowAction;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Structured payload attached to an assistant turn. Surfaces branch on
/// the variant to decide which card or form to render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// The backend needs more detail: free-text question plus optional
    /// clickable answers and the reasoning behind them.
    Clarification {
        action: WorkflowAction,
        summary: Option<SmartSummary>,
        question: Option<String>,
        guided_choices: Vec<GuidedChoice>,
        suggestion: Option<SuggestionMetadata>,
        attempts: u32,
    },
    /// A proposed summary awaiting validation or confirmation.
    Summary {
        action: WorkflowAction,
        summary: Option<SmartSummary>,
    },
    Ticket(TicketRecord),
    /// Sample requests shown after greeting or off-topic messages.
    Examples { examples: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub attachment: Option<Attachment>,
}

/// Append-only conversation history; insertion order is display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn push(&mut self, role: Role, text: impl Into<String>, attachment: Option<Attachment>) {
        self.messages.push(Message {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            created_at: Utc::now(),
            attachment,
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_from(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|message| message.role == role)
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
