use anyhow::Context;
use anyhow::Result;
use clap::Args;
use helpdesk_backend_client::WorkflowApi;
use helpdesk_backend_client::protocol::Modifications;
use helpdesk_backend_client::protocol::SummaryDecision;
use helpdesk_backend_client::protocol::TopicShiftChoice;
use helpdesk_workflow::WELCOME_EXAMPLES;
use helpdesk_workflow::WorkflowError;
use helpdesk_workflow::WorkflowSnapshot;
use helpdesk_workflow::WorkflowStage;
use helpdesk_workflow::WorkflowTracker;
use helpdesk_workflow::is_positive_response;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::ConnectionArgs;
use crate::render::Renderer;

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Start the conversation with this message instead of waiting for input.
    #[arg(value_name = "MESSAGE")]
    pub message: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Problem description to send to the assistant.
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Print the resulting workflow snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}

/// What a line typed at the chat prompt means in the current stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Quit,
    Reset,
    Empty,
    Message(String),
    AutoValidate(String),
    Confirm,
    Modify(Modifications),
    Clarify {
        text: String,
        choice_id: Option<String>,
    },
    TopicShift(TopicShiftChoice),
    /// Not understood in this stage; carries a hint for the user.
    Unrecognized(String),
}

pub fn parse_input(snapshot: &WorkflowSnapshot, line: &str) -> ChatInput {
    let line = line.trim();
    match line {
        "" => return ChatInput::Empty,
        "/quit" | "/exit" => return ChatInput::Quit,
        "/reset" => return ChatInput::Reset,
        _ => {}
    }

    match snapshot.stage {
        stage if stage.accepts_new_message() => ChatInput::Message(line.to_string()),
        WorkflowStage::AutoValidate => ChatInput::AutoValidate(line.to_string()),
        WorkflowStage::ConfirmSummary => parse_confirm(line),
        stage if stage.is_clarifying() => {
            let choices = snapshot.guided_choices.as_deref().unwrap_or_default();
            let picked = line
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|index| choices.get(index));
            match picked {
                Some(choice) => ChatInput::Clarify {
                    text: choice.label.clone(),
                    choice_id: Some(choice.id.clone()),
                },
                None => ChatInput::Clarify {
                    text: line.to_string(),
                    choice_id: None,
                },
            }
        }
        WorkflowStage::TopicShift => {
            let by_number = line
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|index| TopicShiftChoice::ALL.get(index).copied());
            match by_number.or_else(|| TopicShiftChoice::parse(line)) {
                Some(choice) => ChatInput::TopicShift(choice),
                None => ChatInput::Unrecognized(
                    "Choisissez 1, 2 ou 3 (keep_new, keep_old, both_problems)".to_string(),
                ),
            }
        }
        // Only reachable mid-analysis; the tracker answers Busy.
        _ => ChatInput::Message(line.to_string()),
    }
}

fn parse_confirm(line: &str) -> ChatInput {
    if matches!(line, "confirm" | "confirmer") || is_positive_response(line) {
        return ChatInput::Confirm;
    }
    match line.strip_prefix("modify") {
        Some(rest) => ChatInput::Modify(parse_modifications(rest)),
        None => ChatInput::Unrecognized(
            "Tapez « confirm », ou « modify title=<titre>; symptoms=<a>|<b> »".to_string(),
        ),
    }
}

/// Parses `title=<..>; symptoms=<a>|<b>`. Unknown keys are ignored and
/// blank values leave the field untouched.
pub fn parse_modifications(input: &str) -> Modifications {
    let mut modifications = Modifications::default();
    for part in input.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "title" => modifications.title = Some(value.to_string()),
            "symptoms" => {
                let symptoms: Vec<String> = value
                    .split('|')
                    .map(str::trim)
                    .filter(|symptom| !symptom.is_empty())
                    .map(str::to_string)
                    .collect();
                if !symptoms.is_empty() {
                    modifications.symptoms = Some(symptoms);
                }
            }
            other => tracing::debug!(key = other, "ignoring unknown modification key"),
        }
    }
    modifications
}

pub async fn chat(args: ChatArgs, connection: &ConnectionArgs) -> Result<()> {
    let tracker = connection.tracker()?;
    let renderer = Renderer::detect();
    let mut printed = 0;

    println!("Décrivez votre problème informatique. /reset pour recommencer, /quit pour sortir.");
    println!("Par exemple :");
    for example in WELCOME_EXAMPLES {
        println!("  • {example}");
    }

    if let Some(message) = args.message {
        let input = ChatInput::Message(message);
        dispatch(&tracker, input).await;
        printed = print_new_messages(&tracker.snapshot(), printed, renderer);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let snapshot = tracker.snapshot();
        if let Some(hint) = renderer.prompt_hint(&snapshot) {
            println!("{hint}");
        }
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match parse_input(&snapshot, &line) {
            ChatInput::Quit => break,
            ChatInput::Empty => continue,
            ChatInput::Unrecognized(hint) => {
                println!("{hint}");
                continue;
            }
            ChatInput::Reset => {
                tracker.reset();
                printed = 0;
                println!("Conversation réinitialisée.");
                continue;
            }
            input => dispatch(&tracker, input).await,
        }
        printed = print_new_messages(&tracker.snapshot(), printed, renderer);
    }
    Ok(())
}

/// Runs one tracker operation. Failures are already in the transcript,
/// except `Busy` which never touches state.
async fn dispatch<A: WorkflowApi>(tracker: &WorkflowTracker<A>, input: ChatInput) {
    let result = match input {
        ChatInput::Message(text) => tracker.submit_initial_message(&text).await,
        ChatInput::AutoValidate(text) => tracker.submit_auto_validate_response(&text).await,
        ChatInput::Confirm => {
            tracker
                .submit_confirm_or_modify(SummaryDecision::Confirm, None)
                .await
        }
        ChatInput::Modify(modifications) => tracker.submit_modification(modifications).await,
        ChatInput::Clarify { text, choice_id } => {
            tracker
                .submit_clarification(&text, choice_id.as_deref())
                .await
        }
        ChatInput::TopicShift(choice) => tracker.submit_topic_shift_choice(choice).await,
        ChatInput::Quit | ChatInput::Reset | ChatInput::Empty | ChatInput::Unrecognized(_) => {
            return;
        }
    };
    match result {
        Ok(stage) => tracing::debug!(%stage, "operation settled"),
        Err(WorkflowError::Busy) => eprintln!("{}", WorkflowError::Busy.user_message()),
        Err(err) => tracing::debug!(error = %err, "operation failed"),
    }
}

/// Prints transcript entries from `from` on and returns the new count.
fn print_new_messages(snapshot: &WorkflowSnapshot, from: usize, renderer: Renderer) -> usize {
    let messages = snapshot.transcript.messages();
    for message in messages.iter().skip(from) {
        print!("{}", renderer.message(message));
    }
    messages.len()
}

pub async fn analyze(args: AnalyzeArgs, connection: &ConnectionArgs) -> Result<()> {
    let tracker = connection.tracker()?;
    let result = tracker.submit_initial_message(&args.message).await;
    let snapshot = tracker.snapshot();

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?;
        println!("{json}");
    } else {
        let renderer = Renderer::detect();
        print_new_messages(&snapshot, 0, renderer);
        if let Some(hint) = renderer.prompt_hint(&snapshot) {
            println!("{hint}");
        }
    }

    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            let message = err.user_message();
            Err(anyhow::Error::new(err).context(message))
        }
    }
}
