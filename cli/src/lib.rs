pub mod chat_cmd;
pub mod render;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use helpdesk_backend_client::ClientConfig;
use helpdesk_backend_client::HttpWorkflowClient;
use helpdesk_workflow::WorkflowTracker;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::chat_cmd::AnalyzeArgs;
use crate::chat_cmd::ChatArgs;

const USER_EMAIL_ENV_VAR: &str = "HELPDESK_USER_EMAIL";

/// Terminal client for the IT support ticket assistant.
#[derive(Debug, Parser)]
#[command(name = "helpdesk", version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Describe a problem and follow the assistant until a ticket is filed.
    Chat(ChatArgs),
    /// Send a single message and print the assistant's first reply.
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Base URL of the helpdesk backend. Defaults to $HELPDESK_API_URL.
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// TOML file with client settings (base_url, timeout_secs, ...).
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Per-attempt request timeout.
    #[arg(long = "timeout-secs", value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Sent with the first message so the ticket is filed under this user.
    #[arg(long = "user-email", value_name = "EMAIL", env = USER_EMAIL_ENV_VAR, global = true)]
    pub user_email: Option<String>,
}

impl ConnectionArgs {
    /// Flags and env win over the config file, which wins over defaults.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        }
        .with_env_overrides();
        if let Some(url) = self.api_url.as_ref().filter(|url| !url.trim().is_empty()) {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn tracker(&self) -> Result<WorkflowTracker<HttpWorkflowClient>> {
        let client =
            HttpWorkflowClient::new(self.client_config()?).context("failed to build HTTP client")?;
        tracing::debug!(
            base_url = %client.config().base_url,
            timeout_secs = client.config().timeout.as_secs(),
            "connecting to helpdesk backend"
        );
        let tracker = WorkflowTracker::new(client);
        Ok(match &self.user_email {
            Some(email) => tracker.with_user_email(email.clone()),
            None => tracker,
        })
    }
}

/// Logs go to stderr so the conversation on stdout stays readable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Chat(args) => chat_cmd::chat(args, &cli.connection).await,
        Command::Analyze(args) => chat_cmd::analyze(args, &cli.connection).await,
    }
}
