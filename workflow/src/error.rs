use crate::state::WorkflowStage;
use helpdesk_backend_client::ClientError;
use helpdesk_backend_client::FailureKind;
use std::fmt;
use thiserror::Error;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expirée";
pub const NO_RESPONSE_MESSAGE: &str =
    "Impossible de joindre le serveur. Vérifiez votre connexion.";
pub const SERVER_FAULT_MESSAGE: &str =
    "Le serveur a rencontré une erreur. Réessayez dans un instant.";
pub const INVALID_STAGE_MESSAGE: &str = "Cette action n'est pas disponible pour le moment";
pub const EMPTY_MODIFICATIONS_MESSAGE: &str = "Aucune modification à envoyer";
pub const EMPTY_INPUT_MESSAGE: &str = "Votre message est vide";
pub const BUSY_MESSAGE: &str = "Une demande est déjà en cours";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analyze,
    AutoValidate,
    ConfirmSummary,
    Clarify,
    TopicShift,
}

impl Operation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::Analyze => "Erreur lors de l'analyse du message",
            Self::AutoValidate => "Erreur lors de la validation",
            Self::ConfirmSummary => "Erreur lors de la confirmation",
            Self::Clarify => "Erreur lors de la clarification",
            Self::TopicShift => "Erreur lors du changement de sujet",
        }
    }

    pub fn requires_session(self) -> bool {
        !matches!(self, Self::Analyze)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analyze => "analyze",
            Self::AutoValidate => "auto_validate",
            Self::ConfirmSummary => "confirm_summary",
            Self::Clarify => "clarify",
            Self::TopicShift => "topic_shift_choice",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("another operation is already in flight")]
    Busy,

    #[error("no active session for {operation}")]
    SessionExpired { operation: Operation },

    #[error("{operation} is not allowed while {stage}")]
    InvalidStage {
        operation: Operation,
        stage: WorkflowStage,
    },

    #[error("{operation} called with empty input")]
    EmptyInput { operation: Operation },

    #[error("{operation} failed: {source}")]
    Backend {
        operation: Operation,
        #[source]
        source: ClientError,
    },
}

impl WorkflowError {
    /// The fixed string shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => BUSY_MESSAGE.to_string(),
            Self::SessionExpired { .. } => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::InvalidStage { .. } => INVALID_STAGE_MESSAGE.to_string(),
            Self::EmptyInput {
                operation: Operation::ConfirmSummary,
            } => EMPTY_MODIFICATIONS_MESSAGE.to_string(),
            Self::EmptyInput { .. } => EMPTY_INPUT_MESSAGE.to_string(),
            Self::Backend { operation, source } => backend_message(*operation, source),
        }
    }

    /// True when the failure never left the process.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Backend { .. })
    }
}

fn backend_message(operation: Operation, source: &ClientError) -> String {
    let kind = source.kind();
    if kind == FailureKind::NotFound && operation.requires_session() {
        return SESSION_EXPIRED_MESSAGE.to_string();
    }
    if let Some(detail) = source.detail() {
        return detail.to_string();
    }
    match kind {
        FailureKind::NoResponse => NO_RESPONSE_MESSAGE.to_string(),
        FailureKind::ServerFault => SERVER_FAULT_MESSAGE.to_string(),
        FailureKind::NotFound | FailureKind::Rejected => operation.fallback_message().to_string(),
    }
}
