mod error;
mod hints;
mod message;
mod session;
mod state;
mod tracker;

pub use error::Operation;
pub use error::SESSION_EXPIRED_MESSAGE;
pub use error::WorkflowError;
pub use hints::WELCOME_EXAMPLES;
pub use hints::is_positive_response;
pub use message::Attachment;
pub use message::Message;
pub use message::Role;
pub use message::Transcript;
pub use session::Session;
pub use state::MAX_CLARIFICATION_ATTEMPTS;
pub use state::WorkflowSnapshot;
pub use state::WorkflowStage;
pub use state::remaining_clarification_attempts;
pub use tracker::WorkflowTracker;
