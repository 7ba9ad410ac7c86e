//! Drives the tracker through the real HTTP client against a mock backend.

use helpdesk_backend_client::ClientConfig;
use helpdesk_backend_client::HttpWorkflowClient;
use helpdesk_workflow::Attachment;
use helpdesk_workflow::Role;
use helpdesk_workflow::WorkflowStage;
use helpdesk_workflow::WorkflowTracker;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn tracker_for(server: &MockServer) -> WorkflowTracker<HttpWorkflowClient> {
    let config = ClientConfig {
        timeout: Duration::from_millis(500),
        retry_backoff: Duration::from_millis(10),
        ..ClientConfig::new(server.uri())
    };
    WorkflowTracker::new(HttpWorkflowClient::new(config).expect("client"))
}

#[tokio::test]
async fn printer_report_goes_from_clarification_to_ticket() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflow/analyze"))
        .and(body_json(json!({"message": "Imprimante en panne"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "sess-1",
            "type": "smart_summary",
            "action": "ask_clarification",
            "message": "J'ai besoin de précisions",
            "summary": {
                "category": {"id": 3, "name": "Imprimante", "confidence": 0.6},
                "priority": "medium",
                "title": "Imprimante en panne",
                "symptoms": [],
                "extracted_info": {},
                "missing_info": ["modèle"],
                "clarification_question": "Quel est le modèle ?"
            },
            "clarification_attempts": 0,
            "guided_choices": [{"id": "hp", "label": "HP LaserJet"}],
            "expires_at": "2026-10-16T12:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflow/clarify"))
        .and(body_json(json!({
            "session_id": "sess-1",
            "clarification_response": "HP LaserJet",
            "selected_choice_id": "hp"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "sess-1",
            "type": "smart_summary",
            "action": "confirm_summary",
            "message": "Voici le résumé",
            "summary": {
                "category": {"id": 3, "name": "Imprimante", "confidence": 0.9},
                "priority": "medium",
                "title": "Imprimante HP LaserJet en panne",
                "symptoms": ["n'imprime plus"],
                "extracted_info": {"model": "HP LaserJet"},
                "missing_info": null
            },
            "clarification_attempts": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflow/confirm-summary"))
        .and(body_json(json!({"session_id": "sess-1", "user_action": "confirm"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "ticket_created",
            "ticket_id": 41,
            "ticket_number": "TKT-0041",
            "glpi_ticket_id": null,
            "title": "Imprimante HP LaserJet en panne",
            "status": "new",
            "priority": "medium",
            "category_name": "Imprimante",
            "created_at": "2026-10-16T09:30:00",
            "ready_for_L1": true,
            "synced_to_glpi": false,
            "message": "Ticket TKT-0041 créé"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);

    let stage = tracker
        .submit_initial_message("Imprimante en panne")
        .await
        .expect("analyze");
    assert_eq!(stage, WorkflowStage::AskClarification);
    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.transcript.len(), 2);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.clarification_question.as_deref(), Some("Quel est le modèle ?"));

    let stage = tracker
        .submit_clarification("HP LaserJet", Some("hp"))
        .await
        .expect("clarify");
    assert_eq!(stage, WorkflowStage::ConfirmSummary);
    assert_eq!(tracker.snapshot().guided_choices, None);

    let stage = tracker
        .submit_confirm_or_modify(
            helpdesk_backend_client::protocol::SummaryDecision::Confirm,
            None,
        )
        .await
        .expect("confirm");
    assert_eq!(stage, WorkflowStage::Terminal);

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.session, None);
    let last = snapshot.transcript.last().expect("ticket message");
    assert_eq!(last.role, Role::Assistant);
    let Some(Attachment::Ticket(record)) = &last.attachment else {
        panic!("last message carries the ticket");
    };
    assert_eq!(record.ticket_number, "TKT-0041");
    assert!(!record.synced_to_external_system);
}

#[tokio::test]
async fn expired_session_on_backend_surfaces_as_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflow/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "sess-9",
            "type": "smart_summary",
            "action": "auto_validate",
            "message": "Je crée le ticket ?",
            "summary": {"title": "VPN coupé", "symptoms": ["déconnexions"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflow/auto-validate"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Session sess-9 introuvable"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    tracker
        .submit_initial_message("Le VPN se coupe toutes les 5 minutes")
        .await
        .expect("analyze");

    let err = tracker
        .submit_auto_validate_response("oui")
        .await
        .expect_err("expired");
    assert_eq!(err.user_message(), "Session expirée");
    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.stage, WorkflowStage::AutoValidate);
    assert_eq!(
        snapshot.transcript.last().map(|m| (m.role, m.text.as_str())),
        Some((Role::System, "Session expirée"))
    );
}
