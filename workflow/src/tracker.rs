use crate::error::Operation;
use crate::error::WorkflowError;
use crate::hints::WELCOME_EXAMPLES;
use crate::message::Attachment;
use crate::message::Role;
use crate::session::Session;
use crate::state::WorkflowSnapshot;
use crate::state::WorkflowStage;
use helpdesk_backend_client::ClientError;
use helpdesk_backend_client::WorkflowApi;
use helpdesk_backend_client::protocol::AnalysisResponse;
use helpdesk_backend_client::protocol::AnalyzeRequest;
use helpdesk_backend_client::protocol::AutoValidateRequest;
use helpdesk_backend_client::protocol::ClarifyRequest;
use helpdesk_backend_client::protocol::ConfirmSummaryRequest;
use helpdesk_backend_client::protocol::Modifications;
use helpdesk_backend_client::protocol::SummaryDecision;
use helpdesk_backend_client::protocol::TicketRecord;
use helpdesk_backend_client::protocol::TopicShiftChoice;
use helpdesk_backend_client::protocol::TopicShiftRequest;
use helpdesk_backend_client::protocol::WorkflowAction;
use helpdesk_backend_client::protocol::WorkflowReply;
use std::sync::Mutex;
use std::sync::PoisonError;
use tokio::sync::watch;
use tracing::debug;
use tracing::warn;

/// Client-side mirror of the backend's intake workflow.
///
/// Owns the session, transcript, pending action and summary. Every
/// operation follows the same shape: check preconditions locally, mark the
/// tracker as loading, call the backend, then either replace the pending
/// state wholesale with the reply or record the failure in the transcript.
///
/// Operations take `&self` so a surface can keep reading snapshots while a
/// request is in flight. Only one operation runs at a time; a second one
/// started while [`WorkflowSnapshot::is_loading`] is set gets
/// [`WorkflowError::Busy`].
pub struct WorkflowTracker<A> {
    api: A,
    user_email: Option<String>,
    inner: Mutex<Inner>,
    updates: watch::Sender<WorkflowSnapshot>,
}

#[derive(Default)]
struct Inner {
    snapshot: WorkflowSnapshot,
    /// Bumped by `reset` so replies to requests sent before it are dropped.
    generation: u64,
}

impl<A> WorkflowTracker<A> {
    pub fn new(api: A) -> Self {
        let (updates, _) = watch::channel(WorkflowSnapshot::default());
        Self {
            api,
            user_email: None,
            inner: Mutex::new(Inner::default()),
            updates,
        }
    }

    pub fn with_user_email(mut self, user_email: impl Into<String>) -> Self {
        self.user_email = Some(user_email.into());
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.lock().snapshot.clone()
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.updates.subscribe()
    }

    pub fn stage(&self) -> WorkflowStage {
        self.lock().snapshot.stage
    }

    pub fn is_loading(&self) -> bool {
        self.lock().snapshot.is_loading
    }

    /// Back to an empty conversation. Never fails. A request still in
    /// flight keeps the tracker loading until it settles, but its reply is
    /// discarded.
    pub fn reset(&self) {
        self.update(|inner| {
            inner.generation += 1;
            let snapshot = &mut inner.snapshot;
            snapshot.clear_pending();
            snapshot.transcript.clear();
            snapshot.stage = WorkflowStage::Idle;
            snapshot.error = None;
        });
        debug!("workflow reset");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.lock();
        let result = f(&mut inner);
        self.updates.send_replace(inner.snapshot.clone());
        result
    }

    fn begin_analysis(&self, text: &str) -> Result<Begun<'_, A>, WorkflowError> {
        let operation = Operation::Analyze;
        let (generation, prior_stage) = self.update(|inner| {
            check_idle(&inner.snapshot, operation)?;
            check_input(&mut inner.snapshot, operation, text.trim().is_empty())?;
            let prior_stage = inner.snapshot.stage;
            start_loading(&mut inner.snapshot, Some(text));
            inner.snapshot.stage = WorkflowStage::AwaitingAnalysis;
            Ok((inner.generation, prior_stage))
        })?;
        Ok(Begun {
            _guard: LoadingGuard { tracker: self },
            generation,
            prior_stage: Some(prior_stage),
        })
    }

    fn begin_session(
        &self,
        operation: Operation,
        user_text: Option<&str>,
        input_empty: bool,
    ) -> Result<(Begun<'_, A>, String), WorkflowError> {
        let (generation, session_id) = self.update(|inner| {
            let snapshot = &mut inner.snapshot;
            check_idle(snapshot, operation)?;
            let Some(session_id) = snapshot.session.as_ref().map(|s| s.id.clone()) else {
                return Err(record_failure(
                    snapshot,
                    WorkflowError::SessionExpired { operation },
                ));
            };
            if !allowed_stages(operation).contains(&snapshot.stage) {
                let stage = snapshot.stage;
                return Err(record_failure(
                    snapshot,
                    WorkflowError::InvalidStage { operation, stage },
                ));
            }
            check_input(snapshot, operation, input_empty)?;
            start_loading(snapshot, user_text);
            Ok((inner.generation, session_id))
        })?;
        let begun = Begun {
            _guard: LoadingGuard { tracker: self },
            generation,
            prior_stage: None,
        };
        Ok((begun, session_id))
    }

    fn finish(
        &self,
        operation: Operation,
        begun: &Begun<'_, A>,
        result: Result<WorkflowReply, ClientError>,
    ) -> Result<WorkflowStage, WorkflowError> {
        match result {
            Ok(reply) => Ok(self.update(|inner| {
                if inner.generation != begun.generation {
                    debug!(%operation, "discarding reply received after reset");
                    return inner.snapshot.stage;
                }
                apply_reply(&mut inner.snapshot, reply);
                debug!(%operation, stage = %inner.snapshot.stage, "workflow advanced");
                inner.snapshot.stage
            })),
            Err(source) => {
                let err = WorkflowError::Backend { operation, source };
                warn!(%operation, error = %err, "workflow operation failed");
                Err(self.update(|inner| {
                    if inner.generation != begun.generation {
                        return err;
                    }
                    if let Some(stage) = begun.prior_stage {
                        inner.snapshot.stage = stage;
                    }
                    record_failure(&mut inner.snapshot, err)
                }))
            }
        }
    }
}

impl<A: WorkflowApi> WorkflowTracker<A> {
    /// Starts (or restarts) the intake with a free-text problem
    /// description.
    pub async fn submit_initial_message(&self, text: &str) -> Result<WorkflowStage, WorkflowError> {
        let begun = self.begin_analysis(text)?;
        let request = AnalyzeRequest {
            message: text.trim().to_string(),
            user_email: self.user_email.clone(),
        };
        let result = self.api.analyze(request).await;
        self.finish(Operation::Analyze, &begun, result)
    }

    pub async fn submit_auto_validate_response(
        &self,
        text: &str,
    ) -> Result<WorkflowStage, WorkflowError> {
        let operation = Operation::AutoValidate;
        let (begun, session_id) =
            self.begin_session(operation, Some(text), text.trim().is_empty())?;
        let request = AutoValidateRequest {
            session_id,
            user_response: text.trim().to_string(),
        };
        let result = self.api.auto_validate(request).await;
        self.finish(operation, &begun, result)
    }

    /// Confirms the proposed summary as-is, or files it with the user's
    /// edits. `modifications` is ignored for [`SummaryDecision::Confirm`]
    /// and required for [`SummaryDecision::Modify`].
    pub async fn submit_confirm_or_modify(
        &self,
        decision: SummaryDecision,
        modifications: Option<Modifications>,
    ) -> Result<WorkflowStage, WorkflowError> {
        let operation = Operation::ConfirmSummary;
        let modifications = match decision {
            SummaryDecision::Confirm => None,
            SummaryDecision::Modify => modifications.filter(|m| !m.is_empty()),
        };
        let input_empty = decision == SummaryDecision::Modify && modifications.is_none();
        let (begun, session_id) = self.begin_session(operation, None, input_empty)?;
        let request = ConfirmSummaryRequest {
            session_id,
            user_action: decision,
            modifications,
        };
        let result = self
            .api
            .confirm_summary(request)
            .await
            .map(WorkflowReply::from);
        self.finish(operation, &begun, result)
    }

    pub async fn submit_modification(
        &self,
        modifications: Modifications,
    ) -> Result<WorkflowStage, WorkflowError> {
        self.submit_confirm_or_modify(SummaryDecision::Modify, Some(modifications))
            .await
    }

    /// Answers the pending clarification. `choice_id` is set when the user
    /// clicked one of the guided choices; `text` is then its label.
    pub async fn submit_clarification(
        &self,
        text: &str,
        choice_id: Option<&str>,
    ) -> Result<WorkflowStage, WorkflowError> {
        let operation = Operation::Clarify;
        let (begun, session_id) =
            self.begin_session(operation, Some(text), text.trim().is_empty())?;
        let request = ClarifyRequest {
            session_id,
            clarification_response: text.trim().to_string(),
            selected_choice_id: choice_id.map(str::to_string),
        };
        let result = self.api.clarify(request).await;
        self.finish(operation, &begun, result)
    }

    pub async fn submit_topic_shift_choice(
        &self,
        choice: TopicShiftChoice,
    ) -> Result<WorkflowStage, WorkflowError> {
        let operation = Operation::TopicShift;
        let (begun, session_id) = self.begin_session(operation, None, false)?;
        let request = TopicShiftRequest { session_id, choice };
        let result = self.api.topic_shift_choice(request).await;
        self.finish(operation, &begun, result)
    }
}

struct Begun<'a, A> {
    _guard: LoadingGuard<'a, A>,
    generation: u64,
    /// Stage to restore if an analysis fails.
    prior_stage: Option<WorkflowStage>,
}

/// Clears `is_loading` however the operation ends, including when its
/// future is dropped mid-request.
struct LoadingGuard<'a, A> {
    tracker: &'a WorkflowTracker<A>,
}

impl<A> Drop for LoadingGuard<'_, A> {
    fn drop(&mut self) {
        self.tracker.update(|inner| inner.snapshot.is_loading = false);
    }
}

/// Stages a session operation may run from. Analyze has no stage
/// precondition and never consults this.
fn allowed_stages(operation: Operation) -> &'static [WorkflowStage] {
    match operation {
        Operation::Analyze => &[],
        Operation::AutoValidate => &[WorkflowStage::AutoValidate],
        Operation::ConfirmSummary => &[WorkflowStage::ConfirmSummary],
        Operation::Clarify => &[WorkflowStage::AskClarification, WorkflowStage::TooVague],
        Operation::TopicShift => &[WorkflowStage::TopicShift],
    }
}

fn check_idle(snapshot: &WorkflowSnapshot, operation: Operation) -> Result<(), WorkflowError> {
    if snapshot.is_loading {
        debug!(%operation, "rejecting operation while another is in flight");
        return Err(WorkflowError::Busy);
    }
    Ok(())
}

/// Runs after the session and stage guards, so a missing session always
/// wins over blank input.
fn check_input(
    snapshot: &mut WorkflowSnapshot,
    operation: Operation,
    input_empty: bool,
) -> Result<(), WorkflowError> {
    if input_empty {
        return Err(record_failure(
            snapshot,
            WorkflowError::EmptyInput { operation },
        ));
    }
    Ok(())
}

fn start_loading(snapshot: &mut WorkflowSnapshot, user_text: Option<&str>) {
    snapshot.is_loading = true;
    snapshot.error = None;
    if let Some(text) = user_text {
        snapshot.transcript.push(Role::User, text.trim(), None);
    }
}

fn record_failure(snapshot: &mut WorkflowSnapshot, err: WorkflowError) -> WorkflowError {
    let message = err.user_message();
    snapshot.transcript.push(Role::System, message.clone(), None);
    snapshot.error = Some(message);
    err
}

fn apply_reply(snapshot: &mut WorkflowSnapshot, reply: WorkflowReply) {
    match reply {
        WorkflowReply::TicketCreated(record) => apply_ticket(snapshot, record),
        WorkflowReply::Analysis(response) if response.action.is_terminal() => {
            let show_examples = response.show_examples.unwrap_or(false);
            snapshot.clear_pending();
            snapshot.stage = WorkflowStage::Terminal;
            snapshot.show_examples = show_examples;
            let attachment = show_examples.then(|| Attachment::Examples {
                examples: WELCOME_EXAMPLES.iter().map(|e| (*e).to_string()).collect(),
            });
            snapshot
                .transcript
                .push(Role::Assistant, response.message, attachment);
        }
        WorkflowReply::Analysis(response) => apply_continuation(snapshot, response),
    }
}

fn apply_ticket(snapshot: &mut WorkflowSnapshot, record: TicketRecord) {
    snapshot.clear_pending();
    snapshot.stage = WorkflowStage::Terminal;
    let text = record.message.clone();
    snapshot
        .transcript
        .push(Role::Assistant, text, Some(Attachment::Ticket(record)));
}

fn apply_continuation(snapshot: &mut WorkflowSnapshot, response: AnalysisResponse) {
    let session = Session::from_reply(
        response.session_id.as_deref(),
        response.expires_at.as_deref(),
    );
    if session.is_none() {
        warn!(action = %response.action, "backend continued the workflow without a session");
    }
    let question = response.clarification_question().map(str::to_string);
    let guided_choices = response.guided_choices.unwrap_or_default();

    snapshot.session = session;
    snapshot.pending_action = Some(response.action);
    snapshot.stage = WorkflowStage::from_action(response.action);
    snapshot.summary = response.summary.clone();
    snapshot.clarification_question = question.clone();
    snapshot.clarification_attempts = response.clarification_attempts;
    snapshot.guided_choices = (!guided_choices.is_empty()).then(|| guided_choices.clone());
    snapshot.suggestion_metadata = response.suggestion_metadata.clone();
    snapshot.show_examples = response.show_examples.unwrap_or(false);

    let attachment = match response.action {
        WorkflowAction::AutoValidate | WorkflowAction::ConfirmSummary => Attachment::Summary {
            action: response.action,
            summary: response.summary,
        },
        _ => Attachment::Clarification {
            action: response.action,
            summary: response.summary,
            question,
            guided_choices,
            suggestion: response.suggestion_metadata,
            attempts: response.clarification_attempts,
        },
    };
    snapshot
        .transcript
        .push(Role::Assistant, response.message, Some(attachment));
}
