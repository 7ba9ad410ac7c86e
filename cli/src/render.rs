//! Plain-text rendering of transcript entries and attachments.

use helpdesk_backend_client::protocol::GuidedChoice;
use helpdesk_backend_client::protocol::SmartSummary;
use helpdesk_backend_client::protocol::SuggestionMetadata;
use helpdesk_backend_client::protocol::TicketRecord;
use helpdesk_backend_client::protocol::TopicShiftChoice;
use helpdesk_workflow::Attachment;
use helpdesk_workflow::Message;
use helpdesk_workflow::Role;
use helpdesk_workflow::WorkflowSnapshot;
use helpdesk_workflow::WorkflowStage;
use helpdesk_workflow::remaining_clarification_attempts;
use owo_colors::OwoColorize;
use owo_colors::Style;
use std::fmt::Write as _;

/// Reasoning is only worth showing when the backend was not sure of its
/// suggestions.
const SHOW_REASONING_BELOW_RELEVANCE: f64 = 90.0;

pub fn priority_label(priority: &str) -> &str {
    match priority {
        "low" => "Basse",
        "medium" => "Moyenne",
        "high" => "Haute",
        "critical" => "Critique",
        other => other,
    }
}

pub fn topic_shift_label(choice: TopicShiftChoice) -> &'static str {
    match choice {
        TopicShiftChoice::KeepNew => "Traiter le nouveau problème",
        TopicShiftChoice::KeepOld => "Revenir au problème initial",
        TopicShiftChoice::BothProblems => "Traiter les deux problèmes",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn detect() -> Self {
        Self {
            color: supports_color::on(supports_color::Stream::Stdout).is_some(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn message(self, message: &Message) -> String {
        let mut out = String::new();
        match message.role {
            Role::User => {
                let label = self.paint("vous ›", Style::new().bold().cyan());
                let _ = writeln!(out, "{label} {}", message.text);
            }
            Role::Assistant => {
                let label = self.paint("assistant ›", Style::new().bold().green());
                let _ = writeln!(out, "{label} {}", message.text);
            }
            Role::System => {
                let text = self.paint(&format!("⚠ {}", message.text), Style::new().red());
                let _ = writeln!(out, "{text}");
            }
        }
        if let Some(attachment) = &message.attachment {
            out.push_str(&self.attachment(attachment));
        }
        out
    }

    pub fn attachment(self, attachment: &Attachment) -> String {
        match attachment {
            Attachment::Clarification {
                summary,
                question,
                guided_choices,
                suggestion,
                attempts,
                ..
            } => {
                let mut out = String::new();
                if let Some(summary) = summary {
                    out.push_str(&self.summary(summary));
                }
                if let Some(question) = question {
                    let _ = writeln!(out, "  {}", self.paint(question, Style::new().bold()));
                }
                out.push_str(&self.guided_choices(guided_choices, suggestion.as_ref()));
                let remaining = remaining_clarification_attempts(*attempts);
                let _ = writeln!(
                    out,
                    "  {}",
                    self.paint(
                        &format!("Questions restantes : {remaining}"),
                        Style::new().dimmed()
                    )
                );
                out
            }
            Attachment::Summary { summary, .. } => summary
                .as_ref()
                .map(|summary| self.summary(summary))
                .unwrap_or_default(),
            Attachment::Ticket(record) => self.ticket(record),
            Attachment::Examples { examples } => {
                let mut out = String::from("  Par exemple :\n");
                for example in examples {
                    let _ = writeln!(out, "    • {example}");
                }
                out
            }
        }
    }

    pub fn summary(self, summary: &SmartSummary) -> String {
        let mut out = String::new();
        if let Some(title) = &summary.title {
            let _ = writeln!(out, "  ┌ {}", self.paint(title, Style::new().bold()));
        }
        if let Some(category) = &summary.category
            && let Some(name) = &category.name
        {
            match category.confidence {
                Some(confidence) => {
                    let _ = writeln!(out, "  │ Catégorie : {name} ({:.0} %)", confidence * 100.0);
                }
                None => {
                    let _ = writeln!(out, "  │ Catégorie : {name}");
                }
            }
        }
        if let Some(priority) = &summary.priority {
            let _ = writeln!(out, "  │ Priorité : {}", self.priority(priority));
        }
        if !summary.symptoms.is_empty() {
            let _ = writeln!(out, "  │ Symptômes :");
            for symptom in &summary.symptoms {
                let _ = writeln!(out, "  │   - {symptom}");
            }
        }
        if !summary.missing_info.is_empty() {
            let _ = writeln!(
                out,
                "  │ Informations manquantes : {}",
                summary.missing_info.join(", ")
            );
        }
        out
    }

    fn priority(self, priority: &str) -> String {
        let style = match priority {
            "low" => Style::new().green(),
            "medium" => Style::new().yellow(),
            "high" => Style::new().bright_red(),
            "critical" => Style::new().bold().red(),
            _ => Style::new(),
        };
        self.paint(priority_label(priority), style)
    }

    fn guided_choices(
        self,
        choices: &[GuidedChoice],
        suggestion: Option<&SuggestionMetadata>,
    ) -> String {
        let mut out = String::new();
        for (index, choice) in choices.iter().enumerate() {
            let number = index + 1;
            if choice.icon.is_empty() {
                let _ = writeln!(out, "    {number}. {}", choice.label);
            } else {
                let _ = writeln!(out, "    {number}. {} {}", choice.icon, choice.label);
            }
        }
        if let Some(reasoning) = suggestion
            .filter(|s| s.relevance_score < SHOW_REASONING_BELOW_RELEVANCE)
            .and_then(|s| s.reasoning.as_deref())
        {
            let _ = writeln!(out, "    {}", self.paint(reasoning, Style::new().italic().dimmed()));
        }
        out
    }

    pub fn ticket(self, record: &TicketRecord) -> String {
        let mut out = String::new();
        let header = format!("Ticket {} créé", record.ticket_number);
        let _ = writeln!(out, "  ┌ {}", self.paint(&header, Style::new().bold().green()));
        let _ = writeln!(out, "  │ {}", record.title);
        let _ = writeln!(out, "  │ Catégorie : {}", record.category_name);
        let _ = writeln!(out, "  │ Priorité : {}", self.priority(&record.priority));
        let _ = writeln!(out, "  │ Statut : {}", record.status);
        if let Some(external_id) = record.glpi_ticket_id {
            let _ = writeln!(out, "  │ Référence GLPI : {external_id}");
        }
        if record.escalated_to_human {
            let _ = writeln!(out, "  │ Transmis à un technicien");
        }
        out
    }

    /// One-line hint of what the next input should look like.
    pub fn prompt_hint(self, snapshot: &WorkflowSnapshot) -> Option<String> {
        let hint = match snapshot.stage {
            WorkflowStage::Idle | WorkflowStage::AwaitingAnalysis => return None,
            stage if stage.accepts_new_message() => {
                "Décrivez un nouveau problème, ou /quit".to_string()
            }
            stage if stage.is_clarifying() => {
                match snapshot.guided_choices.as_ref().map(Vec::len) {
                    Some(count) if count > 0 => format!("Choix 1-{count}, ou votre réponse"),
                    _ => "Votre réponse".to_string(),
                }
            }
            WorkflowStage::AutoValidate => "Répondez « oui » pour créer le ticket".to_string(),
            WorkflowStage::ConfirmSummary => {
                "confirm | modify title=<titre>; symptoms=<a>|<b>".to_string()
            }
            WorkflowStage::TopicShift => TopicShiftChoice::ALL
                .iter()
                .enumerate()
                .map(|(index, choice)| format!("{}. {}", index + 1, topic_shift_label(*choice)))
                .collect::<Vec<_>>()
                .join("  "),
            // Terminal and the clarifying stages are taken by the guards.
            _ => return None,
        };
        Some(self.paint(&hint, Style::new().dimmed()))
    }
}
