#![allow(dead_code)]

use async_trait::async_trait;
use helpdesk_backend_client::ClientError;
use helpdesk_backend_client::WorkflowApi;
use helpdesk_backend_client::protocol::AnalysisResponse;
use helpdesk_backend_client::protocol::AnalyzeRequest;
use helpdesk_backend_client::protocol::AutoValidateRequest;
use helpdesk_backend_client::protocol::ClarifyRequest;
use helpdesk_backend_client::protocol::ConfirmSummaryRequest;
use helpdesk_backend_client::protocol::TicketRecord;
use helpdesk_backend_client::protocol::TopicShiftRequest;
use helpdesk_backend_client::protocol::WorkflowReply;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Analyze(AnalyzeRequest),
    AutoValidate(AutoValidateRequest),
    ConfirmSummary(ConfirmSummaryRequest),
    Clarify(ClarifyRequest),
    TopicShift(TopicShiftRequest),
}

/// In-process backend that answers from a queue of canned replies and
/// records every request it receives.
#[derive(Default)]
pub struct ScriptedApi {
    replies: Mutex<VecDeque<Result<WorkflowReply, ClientError>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Notify>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request waits for [`ScriptedApi::release`] before answering.
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn reply(self, reply: impl Into<WorkflowReply>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    pub fn fail(self, err: ClientError) -> Self {
        self.push(Err(err));
        self
    }

    pub fn push(&self, reply: Result<WorkflowReply, ClientError>) {
        self.replies.lock().expect("replies").push_back(reply);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    async fn answer(&self, call: Call) -> Result<WorkflowReply, ClientError> {
        self.calls.lock().expect("calls").push(call);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .expect("replies")
            .pop_front()
            .expect("a scripted reply for every request")
    }
}

#[async_trait]
impl WorkflowApi for ScriptedApi {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<WorkflowReply, ClientError> {
        self.answer(Call::Analyze(request)).await
    }

    async fn auto_validate(
        &self,
        request: AutoValidateRequest,
    ) -> Result<WorkflowReply, ClientError> {
        self.answer(Call::AutoValidate(request)).await
    }

    async fn confirm_summary(
        &self,
        request: ConfirmSummaryRequest,
    ) -> Result<TicketRecord, ClientError> {
        match self.answer(Call::ConfirmSummary(request)).await? {
            WorkflowReply::TicketCreated(record) => Ok(record),
            WorkflowReply::Analysis(_) => panic!("confirm-summary only returns tickets"),
        }
    }

    async fn clarify(&self, request: ClarifyRequest) -> Result<WorkflowReply, ClientError> {
        self.answer(Call::Clarify(request)).await
    }

    async fn topic_shift_choice(
        &self,
        request: TopicShiftRequest,
    ) -> Result<WorkflowReply, ClientError> {
        self.answer(Call::TopicShift(request)).await
    }
}

pub fn analysis(action: &str, session_id: Option<&str>, message: &str) -> AnalysisResponse {
    serde_json::from_value(json!({
        "session_id": session_id,
        "type": "smart_summary",
        "action": action,
        "message": message,
        "summary": {
            "category": {"id": 3, "name": "Imprimante", "confidence": 0.55},
            "priority": "medium",
            "title": "Imprimante en panne",
            "symptoms": ["n'imprime plus"],
            "extracted_info": {"location": "bureau 301"},
            "missing_info": ["modèle"],
            "clarification_question": "Quel est le modèle de l'imprimante ?"
        },
        "clarification_attempts": 0,
        "expires_at": session_id.map(|_| "2026-10-16T12:00:00")
    }))
    .expect("analysis fixture")
}

pub fn with_guided_choices(mut response: AnalysisResponse) -> AnalysisResponse {
    response.guided_choices = Some(
        serde_json::from_value(json!([
            {"id": "hp", "label": "HP LaserJet", "icon": "🖨️"},
            {"id": "canon", "label": "Canon"}
        ]))
        .expect("choices fixture"),
    );
    response.suggestion_metadata = Some(
        serde_json::from_value(json!({
            "reasoning": "Les imprimantes du 3e étage sont des HP",
            "relevance_score": 87.5
        }))
        .expect("metadata fixture"),
    );
    response
}

pub fn ticket(number: &str) -> TicketRecord {
    serde_json::from_value(json!({
        "type": "ticket_created",
        "ticket_id": 12,
        "ticket_number": number,
        "title": "Imprimante HP bureau 301 en panne",
        "status": "new",
        "priority": "medium",
        "category_name": "Imprimante",
        "created_at": "2026-10-16T09:30:00",
        "ready_for_L1": true,
        "synced_to_glpi": true,
        "message": format!("Votre ticket {number} a été créé")
    }))
    .expect("ticket fixture")
}

pub fn http_error(endpoint: &str, status: u16, detail: Option<&str>) -> ClientError {
    ClientError::Http {
        endpoint: endpoint.to_string(),
        status: status.try_into().expect("status code"),
        detail: detail.map(str::to_string),
        body: String::new(),
    }
}
